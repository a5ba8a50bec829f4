use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::info;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::error::QueueError;
use crate::models::{PriorityLevel, QueueEntry, QueueStatus, RegisterQueueRequest};
use crate::services::numbering::QueueNumbering;

pub struct RegistrationService {
    supabase: SupabaseClient,
    numbering: QueueNumbering,
}

impl RegistrationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            numbering: QueueNumbering::new(config),
        }
    }

    /// Register a visit in Waiting. Returning patients are referenced by id;
    /// walk-ins get their intake fields stored on the entry itself until
    /// staff accepts them. The caller's assignment lock is held across the
    /// number read and the insert so two registrations in this process
    /// cannot claim the same number.
    pub async fn register(
        &self,
        req: &RegisterQueueRequest,
        assign_lock: &Mutex<()>,
    ) -> Result<QueueEntry, QueueError> {
        let complaint = req.resolved_complaint();
        if complaint.is_empty() {
            return Err(QueueError::InvalidInput("Complaint is required".to_string()));
        }

        let mut row = json!({
            "complaint": complaint,
            "status": QueueStatus::Waiting.as_str(),
            "created_at": Utc::now().to_rfc3339(),
        });

        let priority = match &req.patient_id {
            Some(patient_id) => {
                self.verify_patient(patient_id).await?;
                row["patient_id"] = json!(patient_id);
                row["is_new_patient"] = json!(false);
                // A returning patient keeps the tier of their first visit
                // unless this request overrides it.
                match req.priority_level {
                    Some(level) => level,
                    None => self
                        .inherited_priority(patient_id)
                        .await?
                        .unwrap_or(PriorityLevel::Regular),
                }
            }
            None => {
                self.validate_walk_in(req)?;
                // A duplicate email would only surface at acceptance time,
                // leaving a dead entry in Waiting; reject it here instead.
                if let Some(email) = req.email.as_deref() {
                    if self.email_registered(email).await? {
                        return Err(QueueError::EmailAlreadyRegistered(email.to_string()));
                    }
                }
                row["is_new_patient"] = json!(true);
                row["temp_first_name"] = json!(req.first_name);
                row["temp_middle_name"] = json!(req.middle_name);
                row["temp_last_name"] = json!(req.last_name);
                row["temp_email"] = json!(req.email);
                row["temp_phone_number"] = json!(req.phone_number);
                row["temp_date_of_birth"] =
                    json!(req.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()));
                row["temp_gender"] = json!(req.gender);
                row["temp_street_address"] = json!(req.street_address);
                row["temp_barangay"] = json!(req.barangay);
                row["temp_municipal_city"] = json!(req.municipal_city);
                req.priority_level.unwrap_or(PriorityLevel::Regular)
            }
        };
        row["priority_level"] = json!(priority.as_str());

        let _guard = assign_lock.lock().await;

        let queue_number = self
            .numbering
            .next_queue_number(Utc::now().date_naive(), None)
            .await
            .map_err(|e| QueueError::DatabaseError(e.to_string()))?;
        row["queue_number"] = json!(queue_number);

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let created: Vec<QueueEntry> = self
            .supabase
            .request_with_headers(Method::POST, "/rest/v1/queue_entries", None, Some(row), Some(headers))
            .await
            .map_err(|e| QueueError::DatabaseError(e.to_string()))?;

        let entry = created
            .into_iter()
            .next()
            .ok_or_else(|| QueueError::DatabaseError("Insert returned no row".to_string()))?;

        info!(
            "Registered queue entry {} (number {}, {})",
            entry.id,
            entry.queue_number,
            entry.priority_level.as_str()
        );
        Ok(entry)
    }

    fn validate_walk_in(&self, req: &RegisterQueueRequest) -> Result<(), QueueError> {
        let missing = |field: &str| QueueError::InvalidInput(format!("{} is required", field));

        if req.first_name.as_deref().unwrap_or("").trim().is_empty() {
            return Err(missing("first_name"));
        }
        if req.last_name.as_deref().unwrap_or("").trim().is_empty() {
            return Err(missing("last_name"));
        }
        if req.email.as_deref().unwrap_or("").trim().is_empty() {
            return Err(missing("email"));
        }
        Ok(())
    }

    async fn email_registered(&self, email: &str) -> Result<bool, QueueError> {
        let path = format!(
            "/rest/v1/patients?select=patient_id&email=eq.{}",
            urlencoding::encode(email)
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| QueueError::DatabaseError(e.to_string()))?;

        Ok(!rows.is_empty())
    }

    async fn verify_patient(&self, patient_id: &str) -> Result<(), QueueError> {
        let path = format!(
            "/rest/v1/patients?select=patient_id&patient_id=eq.{}",
            urlencoding::encode(patient_id)
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| QueueError::DatabaseError(e.to_string()))?;

        if rows.is_empty() {
            return Err(QueueError::PatientNotFound(patient_id.to_string()));
        }
        Ok(())
    }

    async fn inherited_priority(&self, patient_id: &str) -> Result<Option<PriorityLevel>, QueueError> {
        let path = format!(
            "/rest/v1/queue_entries?select=priority_level&patient_id=eq.{}&order=created_at.asc&limit=1",
            urlencoding::encode(patient_id)
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| QueueError::DatabaseError(e.to_string()))?;

        Ok(rows.first().and_then(|row| {
            match row["priority_level"].as_str() {
                Some("Priority") => Some(PriorityLevel::Priority),
                Some("Regular") => Some(PriorityLevel::Regular),
                _ => None,
            }
        }))
    }
}

use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::text::slugify;

use crate::error::QueueError;
use crate::models::QueueEntry;

/// Hard cap on identifier probing so pathological data cannot loop forever.
const MAX_ID_ATTEMPTS: u32 = 25;

/// Permanent identity created from a queue entry's temporary bundle. Held
/// by the caller until the linking row update commits, so a failed link can
/// be compensated.
#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    pub patient_id: String,
    pub auth_user_id: String,
}

pub struct IdentityService {
    supabase: SupabaseClient,
}

impl IdentityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Materialize a permanent patient and account from the entry's
    /// temporary fields. Precondition: `entry.is_new_patient`.
    pub async fn resolve_identity(&self, entry: &QueueEntry) -> Result<ResolvedIdentity, QueueError> {
        let email = entry
            .temp_email
            .clone()
            .ok_or_else(|| QueueError::InvalidInput("Queue entry has no temporary email".to_string()))?;
        let last_name = entry.temp_last_name.clone().unwrap_or_default();

        if self.email_exists(&email).await? {
            return Err(QueueError::EmailAlreadyRegistered(email));
        }

        let patient_id = self.generate_patient_id(&last_name).await?;

        // One-time credential instead of the historical patient_id+DOB
        // derivation, which was guessable.
        let credential: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();

        let auth_user: Value = self
            .supabase
            .service_request(
                Method::POST,
                "/auth/v1/admin/users",
                Some(json!({
                    "email": email,
                    "password": credential,
                    "email_confirm": true,
                    "user_metadata": {
                        "role": "patient",
                        "patient_id": patient_id,
                        "first_name": entry.temp_first_name,
                        "last_name": entry.temp_last_name,
                    }
                })),
                None,
            )
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("already") {
                    QueueError::EmailAlreadyRegistered(email.clone())
                } else {
                    QueueError::IdentityError(msg)
                }
            })?;

        let auth_user_id = auth_user["id"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        let patient_data = json!({
            "patient_id": patient_id,
            "user_id": auth_user_id,
            "first_name": entry.temp_first_name,
            "middle_name": entry.temp_middle_name,
            "last_name": entry.temp_last_name,
            "email": email,
            "phone_number": entry.temp_phone_number,
            "date_of_birth": entry.temp_date_of_birth,
            "gender": entry.temp_gender,
            "street_address": entry.temp_street_address,
            "barangay": entry.temp_barangay,
            "municipal_city": entry.temp_municipal_city,
            "created_at": chrono::Utc::now().to_rfc3339(),
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let created: Result<Vec<Value>, _> = self
            .supabase
            .service_request(Method::POST, "/rest/v1/patients", Some(patient_data), Some(headers))
            .await;

        match created {
            Ok(rows) if !rows.is_empty() => {
                info!("Resolved identity for queue entry {}: {}", entry.id, patient_id);
                Ok(ResolvedIdentity {
                    patient_id,
                    auth_user_id,
                })
            }
            Ok(_) => {
                self.delete_auth_user(&auth_user_id).await;
                Err(QueueError::IdentityError(
                    "Patient row creation returned no data".to_string(),
                ))
            }
            Err(e) => {
                self.delete_auth_user(&auth_user_id).await;
                Err(QueueError::IdentityError(e.to_string()))
            }
        }
    }

    /// Undo a resolution whose linking status write failed, so the entry
    /// never points at a half-created identity.
    pub async fn rollback(&self, identity: &ResolvedIdentity) {
        warn!("Rolling back identity resolution for {}", identity.patient_id);

        let path = format!("/rest/v1/patients?patient_id=eq.{}", identity.patient_id);
        if let Err(e) = self
            .supabase
            .service_request::<Value>(Method::DELETE, &path, None, None)
            .await
        {
            error!("Failed to delete patient {} during rollback: {}", identity.patient_id, e);
        }

        self.delete_auth_user(&identity.auth_user_id).await;
    }

    async fn delete_auth_user(&self, auth_user_id: &str) {
        if auth_user_id.is_empty() {
            return;
        }
        let path = format!("/auth/v1/admin/users/{}", auth_user_id);
        if let Err(e) = self
            .supabase
            .service_request::<Value>(Method::DELETE, &path, None, None)
            .await
        {
            error!("Failed to delete auth user {} during rollback: {}", auth_user_id, e);
        }
    }

    async fn email_exists(&self, email: &str) -> Result<bool, QueueError> {
        let path = format!(
            "/rest/v1/patients?select=patient_id&email=eq.{}",
            urlencoding::encode(email)
        );
        let rows: Vec<Value> = self
            .supabase
            .service_request(Method::GET, &path, None, None)
            .await
            .map_err(|e| QueueError::DatabaseError(e.to_string()))?;
        Ok(!rows.is_empty())
    }

    /// Derive `{surname-slug}-02000{suffix}` and probe until a free slot is
    /// found, bounded by MAX_ID_ATTEMPTS.
    async fn generate_patient_id(&self, last_name: &str) -> Result<String, QueueError> {
        let slug = slugify(last_name);

        for attempt in 0..MAX_ID_ATTEMPTS {
            let suffix = &Uuid::new_v4().simple().to_string()[..4];
            let candidate = format!("{}-02000{}", slug, suffix);

            let path = format!("/rest/v1/patients?select=patient_id&patient_id=eq.{}", candidate);
            let rows: Vec<Value> = self
                .supabase
                .service_request(Method::GET, &path, None, None)
                .await
                .map_err(|e| QueueError::DatabaseError(e.to_string()))?;

            if rows.is_empty() {
                return Ok(candidate);
            }
            debug!("Patient id {} taken, attempt {}", candidate, attempt + 1);
        }

        Err(QueueError::IdentifierExhausted {
            attempts: MAX_ID_ATTEMPTS,
        })
    }
}

use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::error::PatientError;
use crate::models::{
    AppointmentHistory, DirectoryEntry, Patient, PatientInfo, PatientWithVisits, QueueStamp,
    SearchResult, TreatmentSummary, UpdatePatientRequest,
};

const VISIT_EMBED: &str = "queue_entries(id,status,created_at,priority_level,queue_number,complaint)";

/// Project joined rows into directory entries, newest visit first. Patients
/// currently sitting in Waiting belong to the live queue display, not the
/// directory, so they are dropped unless `include_waiting` is set.
pub fn project_directory(rows: Vec<PatientWithVisits>, include_waiting: bool) -> Vec<DirectoryEntry> {
    let mut seen = std::collections::HashSet::new();
    let mut entries = Vec::new();

    for row in rows {
        if !seen.insert(row.patient.patient_id.clone()) {
            continue;
        }
        let latest = row.latest_visit().cloned();
        if !include_waiting {
            if let Some(visit) = &latest {
                if visit.status == "Waiting" {
                    continue;
                }
            }
        }
        entries.push(DirectoryEntry {
            age: row.patient.age(),
            patient: row.patient,
            latest_queue: latest,
        });
    }

    entries
}

/// Case-insensitive match across the fields the front desk searches by.
pub fn matches_query(row: &PatientWithVisits, query: &str) -> bool {
    let q = query.to_lowercase();
    let contains = |field: &Option<String>| {
        field
            .as_deref()
            .map(|v| v.to_lowercase().contains(&q))
            .unwrap_or(false)
    };

    row.patient.first_name.to_lowercase().contains(&q)
        || row.patient.last_name.to_lowercase().contains(&q)
        || contains(&row.patient.email)
        || contains(&row.patient.phone_number)
        || row.visits.iter().any(|v| contains(&v.complaint))
}

/// Flatten the PostgREST treatment join shape into the summary the detail
/// page consumes.
pub fn summarize_treatment(row: Option<&Value>) -> TreatmentSummary {
    let Some(row) = row else {
        return TreatmentSummary::default();
    };

    let nested = |key: &str, inner: &str| -> Vec<Value> {
        row[key]
            .as_array()
            .map(|links| {
                links
                    .iter()
                    .filter_map(|link| {
                        let v = &link[inner];
                        (!v.is_null()).then(|| v.clone())
                    })
                    .collect()
            })
            .unwrap_or_default()
    };

    TreatmentSummary {
        id: row["id"].as_i64(),
        treatment_notes: row["treatment_notes"].as_str().unwrap_or_default().to_string(),
        created_at: row["created_at"].as_str().map(str::to_string),
        updated_at: row["updated_at"].as_str().map(str::to_string),
        diagnoses: nested("treatment_diagnoses", "diagnoses"),
        prescriptions: nested("treatment_prescriptions", "prescriptions"),
    }
}

pub fn annotate_appointments(
    rows: &[Value],
    doctor_names: &HashMap<String, String>,
) -> Vec<AppointmentHistory> {
    rows.iter()
        .map(|a| {
            let doctor_id = a["doctor_id"].as_str().map(str::to_string);
            let doctor_name = doctor_id
                .as_deref()
                .and_then(|id| doctor_names.get(id).cloned())
                .unwrap_or_default();
            let reason = a["referrals"]
                .as_object()
                .and_then(|r| r.get("reason"))
                .and_then(Value::as_str)
                .or_else(|| {
                    a["referrals"]
                        .as_array()
                        .and_then(|r| r.first())
                        .and_then(|r| r["reason"].as_str())
                })
                .unwrap_or_default()
                .to_string();

            AppointmentHistory {
                appointment_date: a["appointment_date"].as_str().map(str::to_string),
                status: a["status"].as_str().map(str::to_string),
                doctor_id,
                doctor_name,
                reason,
            }
        })
        .collect()
}

pub struct PatientService {
    supabase: SupabaseClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Staff directory. An on-call doctor only sees patients they have
    /// treated; secretary and admin see everyone.
    pub async fn directory(
        &self,
        user: &User,
        include_waiting: bool,
        auth_token: Option<&str>,
    ) -> Result<Vec<DirectoryEntry>, PatientError> {
        let scope = match user.role.as_deref() {
            Some("on-call-doctor") => {
                let ids = self.treated_patient_ids(&user.id, auth_token).await?;
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                format!("&patient_id=in.({})", ids.join(","))
            }
            _ => String::new(),
        };

        let path = format!("/rest/v1/patients?select=*,{}{}", VISIT_EMBED, scope);
        let rows: Vec<PatientWithVisits> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        debug!("Directory query returned {} patients", rows.len());
        Ok(project_directory(rows, include_waiting))
    }

    pub async fn get_info(
        &self,
        patient_id: &str,
        auth_token: Option<&str>,
    ) -> Result<PatientInfo, PatientError> {
        let patient = self.fetch_patient(patient_id, auth_token).await?;

        let queue_path = format!(
            "/rest/v1/queue_entries?select=id,status,created_at,priority_level,queue_number,complaint&patient_id=eq.{}&order=created_at.desc&limit=1",
            urlencoding::encode(patient_id)
        );
        let queue_rows: Vec<QueueStamp> = self
            .supabase
            .request(Method::GET, &queue_path, auth_token, None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let treatment_path = format!(
            "/rest/v1/treatments?select=id,treatment_notes,created_at,updated_at,patient_id,\
treatment_diagnoses(id,diagnosis_id,diagnoses(*)),\
treatment_prescriptions(id,prescription_id,prescriptions(*,medicines(id,name)))\
&patient_id=eq.{}&order=created_at.desc&limit=1",
            urlencoding::encode(patient_id)
        );
        let treatment_rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &treatment_path, auth_token, None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let appointment_path = format!(
            "/rest/v1/appointments?select=appointment_date,status,doctor_id,referrals(id,reason)&patient_id=eq.{}&order=appointment_date.desc",
            urlencoding::encode(patient_id)
        );
        let appointment_rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &appointment_path, auth_token, None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let doctor_names = self.doctor_names(&appointment_rows, auth_token).await?;

        let lab_path = format!(
            "/rest/v1/lab_results?select=*&patient_id=eq.{}&order=uploaded_at.desc&limit=1",
            urlencoding::encode(patient_id)
        );
        let lab_rows: Vec<crate::models::LabResult> = self
            .supabase
            .request(Method::GET, &lab_path, auth_token, None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        Ok(PatientInfo {
            age: patient.age(),
            latest_queue: queue_rows.into_iter().next(),
            latest_treatment: summarize_treatment(treatment_rows.first()),
            appointments: annotate_appointments(&appointment_rows, &doctor_names),
            latest_lab_result: lab_rows.into_iter().next(),
            patient,
        })
    }

    pub async fn update(
        &self,
        patient_id: &str,
        request: &UpdatePatientRequest,
        auth_token: Option<&str>,
    ) -> Result<Patient, PatientError> {
        if request.is_empty() {
            return Err(PatientError::InvalidInput(
                "No fields to update".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let path = format!(
            "/rest/v1/patients?patient_id=eq.{}",
            urlencoding::encode(patient_id)
        );
        let rows: Vec<Patient> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                auth_token,
                Some(request.patch_body()),
                Some(headers),
            )
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| PatientError::NotFound(patient_id.to_string()))
    }

    pub async fn search(
        &self,
        query: &str,
        auth_token: Option<&str>,
    ) -> Result<Vec<SearchResult>, PatientError> {
        let path = format!("/rest/v1/patients?select=*,{}", VISIT_EMBED);
        let rows: Vec<PatientWithVisits> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let query = query.trim();
        let results = rows
            .into_iter()
            .filter(|row| query.is_empty() || matches_query(row, query))
            .map(|row| {
                let complaint = row
                    .latest_visit()
                    .and_then(|v| v.complaint.clone());
                SearchResult {
                    age: row.patient.age(),
                    patient: row.patient,
                    complaint,
                }
            })
            .collect();

        Ok(results)
    }

    async fn fetch_patient(
        &self,
        patient_id: &str,
        auth_token: Option<&str>,
    ) -> Result<Patient, PatientError> {
        let path = format!(
            "/rest/v1/patients?select=*&patient_id=eq.{}",
            urlencoding::encode(patient_id)
        );
        let rows: Vec<Patient> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| PatientError::NotFound(patient_id.to_string()))
    }

    async fn treated_patient_ids(
        &self,
        doctor_id: &str,
        auth_token: Option<&str>,
    ) -> Result<Vec<String>, PatientError> {
        let path = format!(
            "/rest/v1/treatments?select=patient_id&doctor_id=eq.{}",
            urlencoding::encode(doctor_id)
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let mut ids: Vec<String> = rows
            .iter()
            .filter_map(|row| row["patient_id"].as_str().map(str::to_string))
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    async fn doctor_names(
        &self,
        appointments: &[Value],
        auth_token: Option<&str>,
    ) -> Result<HashMap<String, String>, PatientError> {
        let mut ids: Vec<&str> = appointments
            .iter()
            .filter_map(|a| a["doctor_id"].as_str())
            .collect();
        ids.sort();
        ids.dedup();

        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let path = format!(
            "/rest/v1/doctors?select=id,first_name,last_name&id=in.({})",
            ids.join(",")
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        Ok(rows
            .iter()
            .filter_map(|doc| {
                let id = doc["id"].as_str()?;
                let name = format!(
                    "{} {}",
                    doc["first_name"].as_str().unwrap_or_default(),
                    doc["last_name"].as_str().unwrap_or_default()
                )
                .trim()
                .to_string();
                Some((id.to_string(), name))
            })
            .collect())
    }
}

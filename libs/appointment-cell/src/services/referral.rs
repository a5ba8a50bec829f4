use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::info;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::error::AppointmentError;
use crate::models::{CreateReferralRequest, Referral, ReferralStatusUpdate};

pub struct ReferralService {
    supabase: SupabaseClient,
}

impl ReferralService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// The caller is always the referring doctor; only the receiving side
    /// is taken from the request.
    pub async fn create(
        &self,
        request: &CreateReferralRequest,
        referring_doctor: &User,
        auth_token: Option<&str>,
    ) -> Result<Referral, AppointmentError> {
        request.validate()?;

        self.verify_patient(&request.patient_id, auth_token).await?;
        self.verify_doctor(&request.receiving_doctor, auth_token).await?;

        let body = json!({
            "referring_doctor": referring_doctor.id,
            "receiving_doctor": request.receiving_doctor,
            "patient_id": request.patient_id,
            "reason": request.reason,
            "notes": request.notes,
            "status": "Pending",
            "created_at": Utc::now().to_rfc3339(),
        });

        let rows: Vec<Referral> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/referrals",
                auth_token,
                Some(body),
                Some(representation()),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let referral = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("Insert returned no row".to_string()))?;

        info!(
            "Referral {} created: {} -> {} for patient {}",
            referral.id, referral.referring_doctor, referral.receiving_doctor, referral.patient_id
        );
        Ok(referral)
    }

    /// Doctors see referrals addressed to them; everyone else sees all.
    pub async fn list(
        &self,
        user: &User,
        auth_token: Option<&str>,
    ) -> Result<Vec<Referral>, AppointmentError> {
        let mut path = "/rest/v1/referrals?select=*&order=created_at.desc".to_string();
        if user.is_doctor() {
            path.push_str(&format!(
                "&receiving_doctor=eq.{}",
                urlencoding::encode(&user.id)
            ));
        }

        self.supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }

    pub async fn update_status(
        &self,
        id: i64,
        update: &ReferralStatusUpdate,
        auth_token: Option<&str>,
    ) -> Result<Referral, AppointmentError> {
        update.validate()?;

        let path = format!("/rest/v1/referrals?id=eq.{}", id);
        let rows: Vec<Referral> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                auth_token,
                Some(json!({ "status": update.status })),
                Some(representation()),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or(AppointmentError::ReferralNotFound(id))
    }

    async fn verify_patient(
        &self,
        patient_id: &str,
        auth_token: Option<&str>,
    ) -> Result<(), AppointmentError> {
        let path = format!(
            "/rest/v1/patients?select=patient_id&patient_id=eq.{}",
            urlencoding::encode(patient_id)
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if rows.is_empty() {
            return Err(AppointmentError::PatientNotFound(patient_id.to_string()));
        }
        Ok(())
    }

    async fn verify_doctor(
        &self,
        doctor_id: &str,
        auth_token: Option<&str>,
    ) -> Result<(), AppointmentError> {
        let path = format!(
            "/rest/v1/doctors?select=id&id=eq.{}",
            urlencoding::encode(doctor_id)
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if rows.is_empty() {
            return Err(AppointmentError::DoctorNotFound(doctor_id.to_string()));
        }
        Ok(())
    }
}

fn representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

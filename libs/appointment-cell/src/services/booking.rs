use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;
use shared_utils::text::slugify;

use crate::error::AppointmentError;
use crate::models::{
    Appointment, AppointmentDetail, AppointmentQuery, BookAppointmentRequest, BookingPatient,
    Payment, CONSULTATION_FEE,
};

pub struct BookingService {
    supabase: SupabaseClient,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Book a visit from the website. The patient is matched by phone
    /// number and refreshed with the submitted details, the doctor must
    /// exist, and the appointment always starts with a Pending payment at
    /// the fixed consultation fee.
    pub async fn book(
        &self,
        request: &BookAppointmentRequest,
        scheduled_by: Option<&User>,
        auth_token: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        request.validate()?;

        self.verify_doctor(&request.doctor_id, auth_token).await?;
        let patient_id = self.upsert_patient(&request.patient, auth_token).await?;

        let appointment_body = json!({
            "patient_id": patient_id,
            "doctor_id": request.doctor_id,
            "appointment_date": request.appointment_date,
            "status": "Scheduled",
            "notes": request.notes,
            "scheduled_by": scheduled_by.map(|u| u.id.clone()),
            "created_at": Utc::now().to_rfc3339(),
        });

        let rows: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                auth_token,
                Some(appointment_body),
                Some(representation()),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let appointment = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("Insert returned no row".to_string()))?;

        let payment_body = json!({
            "appointment_id": appointment.id,
            "patient_id": patient_id,
            "payment_method": request.payment_method,
            "amount": CONSULTATION_FEE,
            "status": "Pending",
            "created_at": Utc::now().to_rfc3339(),
        });

        let payment: Result<Vec<Payment>, _> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/payments",
                auth_token,
                Some(payment_body),
                Some(representation()),
            )
            .await;

        if let Err(e) = payment {
            // An appointment without its payment row is worse than no
            // appointment; take it back out.
            error!("Payment creation failed, removing appointment {}: {}", appointment.id, e);
            let path = format!("/rest/v1/appointments?id=eq.{}", appointment.id);
            if let Err(cleanup) = self
                .supabase
                .request::<Vec<Value>>(Method::DELETE, &path, auth_token, None)
                .await
            {
                error!("Could not remove appointment {}: {}", appointment.id, cleanup);
            }
            return Err(AppointmentError::DatabaseError(e.to_string()));
        }

        info!(
            "Booked appointment {} for patient {} with doctor {}",
            appointment.id, patient_id, request.doctor_id
        );
        Ok(appointment)
    }

    pub async fn list(
        &self,
        query: &AppointmentQuery,
        auth_token: Option<&str>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut path = "/rest/v1/appointments?select=*&order=appointment_date.desc".to_string();
        if let Some(patient_id) = &query.patient_id {
            path.push_str(&format!("&patient_id=eq.{}", urlencoding::encode(patient_id)));
        }
        if let Some(doctor_id) = &query.doctor_id {
            path.push_str(&format!("&doctor_id=eq.{}", urlencoding::encode(doctor_id)));
        }

        self.supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }

    pub async fn detail(
        &self,
        id: i64,
        auth_token: Option<&str>,
    ) -> Result<AppointmentDetail, AppointmentError> {
        let path = format!("/rest/v1/appointments?select=*,payments(*)&id=eq.{}", id);
        let rows: Vec<AppointmentDetail> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(AppointmentError::NotFound(id))
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

    /// Match on phone number; update the matched row with the submitted
    /// details, or create a fresh patient when nobody matches.
    async fn upsert_patient(
        &self,
        patient: &BookingPatient,
        auth_token: Option<&str>,
    ) -> Result<String, AppointmentError> {
        let lookup = format!(
            "/rest/v1/patients?select=patient_id&phone_number=eq.{}",
            urlencoding::encode(&patient.phone_number)
        );
        let existing: Vec<Value> = self
            .supabase
            .request(Method::GET, &lookup, auth_token, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let demographics = json!({
            "first_name": patient.first_name,
            "middle_name": patient.middle_name,
            "last_name": patient.last_name,
            "email": patient.email,
            "phone_number": patient.phone_number,
            "date_of_birth": patient.date_of_birth,
            "gender": patient.gender,
            "street_address": patient.street_address,
            "barangay": patient.barangay,
            "municipal_city": patient.municipal_city,
        });

        if let Some(found) = existing.first().and_then(|row| row["patient_id"].as_str()) {
            let path = format!(
                "/rest/v1/patients?patient_id=eq.{}",
                urlencoding::encode(found)
            );
            self.supabase
                .request::<Vec<Value>>(Method::PATCH, &path, auth_token, Some(demographics))
                .await
                .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;
            return Ok(found.to_string());
        }

        let suffix = &Uuid::new_v4().simple().to_string()[..4];
        let patient_id = format!("{}-02000{}", slugify(&patient.last_name), suffix);

        let mut body = demographics;
        body["patient_id"] = json!(patient_id);
        body["created_at"] = json!(Utc::now().to_rfc3339());

        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/patients",
                auth_token,
                Some(body),
                Some(representation()),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if rows.is_empty() {
            return Err(AppointmentError::DatabaseError(
                "Patient creation returned no row".to_string(),
            ));
        }
        Ok(patient_id)
    }
}

fn representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

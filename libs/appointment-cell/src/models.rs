use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppointmentError;

/// Fixed consultation fee charged at booking time.
pub const CONSULTATION_FEE: f64 = 500.00;

const PAYMENT_METHODS: [&str; 3] = ["cash", "gcash", "paymaya"];
const REFERRAL_STATUSES: [&str; 4] = ["Pending", "Accepted", "Declined", "Completed"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: String,
    pub doctor_id: String,
    pub appointment_date: String,
    pub status: String,
    pub notes: Option<String>,
    pub scheduled_by: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub appointment_id: i64,
    pub patient_id: String,
    pub payment_method: String,
    pub amount: f64,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentDetail {
    #[serde(flatten)]
    pub appointment: Appointment,
    #[serde(rename = "payments", default)]
    pub payment_rows: Vec<Payment>,
}

impl AppointmentDetail {
    pub fn payment(&self) -> Option<&Payment> {
        self.payment_rows.first()
    }
}

/// Patient block of a booking request. Phone number is the lookup key for
/// update-or-create, so it is the one hard requirement.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingPatient {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: Option<String>,
    pub phone_number: String,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub street_address: Option<String>,
    pub barangay: Option<String>,
    pub municipal_city: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient: BookingPatient,
    pub doctor_id: String,
    pub appointment_date: String,
    pub notes: Option<String>,
    pub payment_method: String,
}

impl BookAppointmentRequest {
    pub fn validate(&self) -> Result<(), AppointmentError> {
        if self.patient.phone_number.trim().is_empty() {
            return Err(AppointmentError::InvalidInput(
                "phone_number is required".to_string(),
            ));
        }
        if self.patient.first_name.trim().is_empty() || self.patient.last_name.trim().is_empty() {
            return Err(AppointmentError::InvalidInput(
                "Patient name is required".to_string(),
            ));
        }
        if self.appointment_date.trim().is_empty() {
            return Err(AppointmentError::InvalidInput(
                "appointment_date is required".to_string(),
            ));
        }
        if !PAYMENT_METHODS.contains(&self.payment_method.as_str()) {
            return Err(AppointmentError::InvalidInput(format!(
                "Unsupported payment method: {}",
                self.payment_method
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentQuery {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Referral {
    pub id: i64,
    pub referring_doctor: String,
    pub receiving_doctor: String,
    pub patient_id: String,
    pub reason: String,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReferralRequest {
    pub patient_id: String,
    pub receiving_doctor: String,
    pub reason: String,
    pub notes: Option<String>,
}

impl CreateReferralRequest {
    pub fn validate(&self) -> Result<(), AppointmentError> {
        if self.reason.trim().is_empty() {
            return Err(AppointmentError::InvalidInput(
                "reason is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferralStatusUpdate {
    pub status: String,
}

impl ReferralStatusUpdate {
    pub fn validate(&self) -> Result<(), AppointmentError> {
        if !REFERRAL_STATUSES.contains(&self.status.as_str()) {
            return Err(AppointmentError::InvalidInput(format!(
                "Unsupported referral status: {}",
                self.status
            )));
        }
        Ok(())
    }
}

use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found: {0}")]
    NotFound(i64),

    #[error("Doctor not found: {0}")]
    DoctorNotFound(String),

    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    #[error("Referral not found: {0}")]
    ReferralNotFound(i64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound(_)
            | AppointmentError::DoctorNotFound(_)
            | AppointmentError::PatientNotFound(_)
            | AppointmentError::ReferralNotFound(_) => AppError::NotFound(err.to_string()),
            AppointmentError::InvalidInput(_) => AppError::BadRequest(err.to_string()),
            AppointmentError::DatabaseError(_) | AppointmentError::SerializationError(_) => {
                AppError::Database(err.to_string())
            }
        }
    }
}

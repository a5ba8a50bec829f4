use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum PatientError {
    #[error("Patient not found: {0}")]
    NotFound(String),

    #[error("Lab request not found: {0}")]
    LabRequestNotFound(i64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound(_) | PatientError::LabRequestNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            PatientError::InvalidInput(_) => AppError::BadRequest(err.to_string()),
            PatientError::StorageError(_) => AppError::ExternalService(err.to_string()),
            PatientError::DatabaseError(_) | PatientError::SerializationError(_) => {
                AppError::Database(err.to_string())
            }
        }
    }
}

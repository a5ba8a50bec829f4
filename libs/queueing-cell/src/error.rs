use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Queue entry not found: {0}")]
    EntryNotFound(String),

    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Email already registered: {0}")]
    EmailAlreadyRegistered(String),

    #[error("Could not derive a free patient identifier after {attempts} attempts")]
    IdentifierExhausted { attempts: u32 },

    #[error("Identity resolution failed: {0}")]
    IdentityError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<QueueError> for AppError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::EntryNotFound(_) | QueueError::PatientNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            QueueError::InvalidAction(_) | QueueError::InvalidInput(_) => {
                AppError::BadRequest(err.to_string())
            }
            QueueError::EmailAlreadyRegistered(_) => AppError::Conflict(err.to_string()),
            QueueError::IdentifierExhausted { .. } | QueueError::IdentityError(_) => {
                AppError::Internal(err.to_string())
            }
            QueueError::DatabaseError(_) | QueueError::SerializationError(_) => {
                AppError::Database(err.to_string())
            }
        }
    }
}

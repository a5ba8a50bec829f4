use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum MedicineError {
    #[error("Medicine not found: {0}")]
    NotFound(i64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<MedicineError> for AppError {
    fn from(err: MedicineError) -> Self {
        match err {
            MedicineError::NotFound(_) => AppError::NotFound(err.to_string()),
            MedicineError::InvalidInput(_) => AppError::BadRequest(err.to_string()),
            MedicineError::DatabaseError(_) | MedicineError::SerializationError(_) => {
                AppError::Database(err.to_string())
            }
        }
    }
}

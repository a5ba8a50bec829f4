use serde::{Deserialize, Serialize};

use crate::error::MedicineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
    pub id: i64,
    pub name: String,
    pub dosage_form: Option<String>,
    pub strength: Option<String>,
    pub stocks: i32,
    pub expiration_date: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct MedicineWrite {
    pub name: String,
    pub dosage_form: Option<String>,
    pub strength: Option<String>,
    pub stocks: Option<i32>,
    pub expiration_date: Option<String>,
}

impl MedicineWrite {
    pub fn validate(&self) -> Result<(), MedicineError> {
        if self.name.trim().is_empty() {
            return Err(MedicineError::InvalidInput("name is required".to_string()));
        }
        if self.stocks.is_some_and(|s| s < 0) {
            return Err(MedicineError::InvalidInput(
                "stocks cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MedicineListQuery {
    #[serde(default)]
    pub show_archived: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MedicineSearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: i64,
    pub medication_id: i64,
    pub quantity: i32,
    pub start_date: Option<String>,
    pub patient_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispenseRequest {
    #[serde(default)]
    pub prescriptions: Vec<DispenseItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispenseItem {
    pub id: Option<i64>,
    /// Clients send this as either a number or a numeric string.
    pub confirmed: Option<serde_json::Value>,
}

impl DispenseItem {
    pub fn confirmed_quantity(&self) -> Option<i32> {
        match self.confirmed.as_ref() {
            Some(serde_json::Value::Number(n)) => n.as_i64().map(|v| v as i32),
            Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
            None => Some(0),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispenseError {
    pub id: Option<i64>,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub medicine_id: i64,
    pub name: String,
    pub forecast_next_3_months: Vec<i64>,
    pub method: String,
    pub months_of_data: usize,
    pub total_prescriptions: i64,
}

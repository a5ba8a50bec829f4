use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::error::MedicineError;
use crate::models::{DispenseError, DispenseItem, DispenseRequest};

#[derive(Debug, Deserialize)]
struct PrescriptionWithStock {
    id: i64,
    quantity: i32,
    #[serde(rename = "medicines")]
    medicine: Option<StockRow>,
}

#[derive(Debug, Deserialize)]
struct StockRow {
    id: i64,
    stocks: i32,
}

pub struct DispenseService {
    supabase: SupabaseClient,
}

impl DispenseService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Deduct confirmed quantities from stock, item by item. One bad item
    /// does not stop the rest; every failure is reported back per item and
    /// earlier deductions stand.
    pub async fn confirm(
        &self,
        request: &DispenseRequest,
        auth_token: Option<&str>,
    ) -> Result<Vec<DispenseError>, MedicineError> {
        let mut errors = Vec::new();

        for item in &request.prescriptions {
            if let Some(error) = self.dispense_one(item, auth_token).await? {
                errors.push(error);
            }
        }

        Ok(errors)
    }

    async fn dispense_one(
        &self,
        item: &DispenseItem,
        auth_token: Option<&str>,
    ) -> Result<Option<DispenseError>, MedicineError> {
        let fail = |error: &str| {
            Some(DispenseError {
                id: item.id,
                error: error.to_string(),
            })
        };

        let Some(confirmed) = item.confirmed_quantity() else {
            return Ok(fail("Invalid confirmed quantity"));
        };
        if confirmed < 0 {
            return Ok(fail("Invalid confirmed quantity"));
        }
        let Some(prescription_id) = item.id else {
            return Ok(fail("Prescription not found"));
        };

        let path = format!(
            "/rest/v1/prescriptions?select=id,quantity,medicines(id,stocks)&id=eq.{}",
            prescription_id
        );
        let rows: Vec<PrescriptionWithStock> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| MedicineError::DatabaseError(e.to_string()))?;

        let Some(prescription) = rows.into_iter().next() else {
            return Ok(fail("Prescription not found"));
        };
        if confirmed > prescription.quantity {
            return Ok(fail("Confirmed quantity exceeds the prescribed quantity"));
        }
        let Some(medicine) = prescription.medicine else {
            return Ok(fail("Prescription not found"));
        };
        if medicine.stocks < confirmed {
            return Ok(fail("Not enough stock available"));
        }

        let patch_path = format!("/rest/v1/medicines?id=eq.{}", medicine.id);
        let result: Result<Vec<serde_json::Value>, _> = self
            .supabase
            .request(
                Method::PATCH,
                &patch_path,
                auth_token,
                Some(json!({ "stocks": medicine.stocks - confirmed })),
            )
            .await;

        match result {
            Ok(_) => {
                info!(
                    "Dispensed {} units of medicine {} for prescription {}",
                    confirmed, medicine.id, prescription.id
                );
                Ok(None)
            }
            Err(e) => Ok(fail(&format!("Stock update failed: {}", e))),
        }
    }
}

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::json;
use tracing::info;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::error::MedicineError;
use crate::models::{Medicine, MedicineWrite};

pub struct InventoryService {
    supabase: SupabaseClient,
}

impl InventoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Archived medicines stay out of the list unless explicitly asked for.
    pub async fn list(
        &self,
        show_archived: bool,
        auth_token: Option<&str>,
    ) -> Result<Vec<Medicine>, MedicineError> {
        let path = if show_archived {
            "/rest/v1/medicines?select=*&order=name.asc".to_string()
        } else {
            "/rest/v1/medicines?select=*&is_active=eq.true&order=name.asc".to_string()
        };
        self.fetch(&path, auth_token).await
    }

    pub async fn archived(&self, auth_token: Option<&str>) -> Result<Vec<Medicine>, MedicineError> {
        self.fetch(
            "/rest/v1/medicines?select=*&is_active=eq.false&order=name.asc",
            auth_token,
        )
        .await
    }

    pub async fn get(&self, id: i64, auth_token: Option<&str>) -> Result<Medicine, MedicineError> {
        let path = format!("/rest/v1/medicines?select=*&id=eq.{}", id);
        let rows = self.fetch(&path, auth_token).await?;
        rows.into_iter().next().ok_or(MedicineError::NotFound(id))
    }

    pub async fn search(
        &self,
        query: &str,
        auth_token: Option<&str>,
    ) -> Result<Vec<Medicine>, MedicineError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let path = format!(
            "/rest/v1/medicines?select=*&name=ilike.{}&is_active=eq.true",
            urlencoding::encode(&format!("*{}*", query.trim()))
        );
        self.fetch(&path, auth_token).await
    }

    pub async fn create(
        &self,
        request: &MedicineWrite,
        auth_token: Option<&str>,
    ) -> Result<Medicine, MedicineError> {
        request.validate()?;

        let body = json!({
            "name": request.name.trim(),
            "dosage_form": request.dosage_form,
            "strength": request.strength,
            "stocks": request.stocks.unwrap_or(0),
            "expiration_date": request.expiration_date,
            "is_active": true,
        });

        let rows: Vec<Medicine> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/medicines",
                auth_token,
                Some(body),
                Some(representation()),
            )
            .await
            .map_err(|e| MedicineError::DatabaseError(e.to_string()))?;

        let medicine = rows
            .into_iter()
            .next()
            .ok_or_else(|| MedicineError::DatabaseError("Insert returned no row".to_string()))?;
        info!("Created medicine {} ({})", medicine.id, medicine.name);
        Ok(medicine)
    }

    pub async fn update(
        &self,
        id: i64,
        request: &MedicineWrite,
        auth_token: Option<&str>,
    ) -> Result<Medicine, MedicineError> {
        request.validate()?;

        let body = json!({
            "name": request.name.trim(),
            "dosage_form": request.dosage_form,
            "strength": request.strength,
            "stocks": request.stocks,
            "expiration_date": request.expiration_date,
        });

        self.patch(id, body, auth_token).await
    }

    pub async fn set_archived(
        &self,
        id: i64,
        archived: bool,
        auth_token: Option<&str>,
    ) -> Result<Medicine, MedicineError> {
        let medicine = self
            .patch(id, json!({ "is_active": !archived }), auth_token)
            .await?;
        info!(
            "Medicine {} {}",
            id,
            if archived { "archived" } else { "unarchived" }
        );
        Ok(medicine)
    }

    async fn fetch(
        &self,
        path: &str,
        auth_token: Option<&str>,
    ) -> Result<Vec<Medicine>, MedicineError> {
        self.supabase
            .request(Method::GET, path, auth_token, None)
            .await
            .map_err(|e| MedicineError::DatabaseError(e.to_string()))
    }

    async fn patch(
        &self,
        id: i64,
        body: serde_json::Value,
        auth_token: Option<&str>,
    ) -> Result<Medicine, MedicineError> {
        let path = format!("/rest/v1/medicines?id=eq.{}", id);
        let rows: Vec<Medicine> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                auth_token,
                Some(body),
                Some(representation()),
            )
            .await
            .map_err(|e| MedicineError::DatabaseError(e.to_string()))?;

        rows.into_iter().next().ok_or(MedicineError::NotFound(id))
    }
}

fn representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

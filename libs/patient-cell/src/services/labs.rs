use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::error::PatientError;
use crate::models::{CreateLabRequestRequest, LabRequest, LabResult, LabResultUpload};

/// Storage object path without the bucket name, leading slashes or
/// duplicated bucket-like segments. Upload clients have been seen sending
/// all three.
pub fn sanitize_object_path(raw: &str, bucket: &str) -> String {
    let bucket_lower = bucket.to_lowercase();
    raw.trim()
        .split('/')
        .filter(|segment| {
            let s = segment.to_lowercase();
            !segment.is_empty() && s != bucket_lower && s != "lab_results" && s != "lab"
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// File extension including the dot, lowercased; empty when there is none.
fn extension_of(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default()
}

pub struct LabService {
    supabase: SupabaseClient,
    bucket: String,
}

impl LabService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            bucket: config.storage_bucket.clone(),
        }
    }

    pub async fn create_request(
        &self,
        request: &CreateLabRequestRequest,
        user: &User,
        auth_token: Option<&str>,
    ) -> Result<LabRequest, PatientError> {
        if request.test_type.trim().is_empty() {
            return Err(PatientError::InvalidInput("test_type is required".to_string()));
        }

        let body = json!({
            "patient_id": request.patient_id,
            "test_type": request.test_type,
            "notes": request.notes,
            "status": "Pending",
            "requested_by": user.id,
            "created_at": Utc::now().to_rfc3339(),
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let rows: Vec<LabRequest> = self
            .supabase
            .request_with_headers(Method::POST, "/rest/v1/lab_requests", auth_token, Some(body), Some(headers))
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| PatientError::DatabaseError("Insert returned no row".to_string()))
    }

    pub async fn pending_requests(
        &self,
        auth_token: Option<&str>,
    ) -> Result<Vec<LabRequest>, PatientError> {
        let rows: Vec<LabRequest> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/lab_requests?select=*&status=eq.Pending&order=created_at.desc",
                auth_token,
                None,
            )
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;
        Ok(rows)
    }

    /// Store the uploaded image and persist a result row pointing at it.
    /// When the upload answers a pending request, that request is marked
    /// Completed; a failure there is logged but does not undo the upload.
    pub async fn upload_result(
        &self,
        upload: &LabResultUpload,
        auth_token: Option<&str>,
    ) -> Result<LabResult, PatientError> {
        let base64_data = match upload.image.split_once(";base64,") {
            Some((_, data)) => data,
            None => upload.image.as_str(),
        };
        let bytes = BASE64
            .decode(base64_data)
            .map_err(|e| PatientError::InvalidInput(format!("Invalid image encoding: {}", e)))?;
        if bytes.is_empty() {
            return Err(PatientError::InvalidInput("Empty image payload".to_string()));
        }

        let unique_name = format!(
            "{}{}",
            Uuid::new_v4().simple(),
            extension_of(upload.file_name.as_deref())
        );
        let candidate = format!("{}/{}", upload.patient_id.trim(), unique_name);
        let object_path = sanitize_object_path(&candidate, &self.bucket);
        let content_type = upload.content_type.as_deref().unwrap_or("image/jpeg");

        self.supabase
            .upload_object(&self.bucket, &object_path, bytes, content_type)
            .await
            .map_err(|e| PatientError::StorageError(e.to_string()))?;

        let public_url = self.supabase.get_public_url(&self.bucket, &object_path);

        let body = json!({
            "lab_request_id": upload.lab_request_id,
            "patient_id": upload.patient_id,
            "object_path": object_path,
            "public_url": public_url,
            "uploaded_at": Utc::now().to_rfc3339(),
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let rows: Vec<LabResult> = self
            .supabase
            .request_with_headers(Method::POST, "/rest/v1/lab_results", auth_token, Some(body), Some(headers))
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        let result = rows
            .into_iter()
            .next()
            .ok_or_else(|| PatientError::DatabaseError("Insert returned no row".to_string()))?;

        if let Some(request_id) = upload.lab_request_id {
            let path = format!("/rest/v1/lab_requests?id=eq.{}", request_id);
            let completed: Result<Vec<serde_json::Value>, _> = self
                .supabase
                .request(
                    Method::PATCH,
                    &path,
                    auth_token,
                    Some(json!({ "status": "Completed" })),
                )
                .await;
            if let Err(e) = completed {
                warn!("Could not mark lab request {} completed: {}", request_id, e);
            }
        }

        info!(
            "Stored lab result {} for patient {}",
            result.id, result.patient_id
        );
        Ok(result)
    }

    pub async fn results_for(
        &self,
        patient_id: &str,
        auth_token: Option<&str>,
    ) -> Result<Vec<LabResult>, PatientError> {
        let path = format!(
            "/rest/v1/lab_results?select=*&patient_id=eq.{}&order=uploaded_at.desc",
            urlencoding::encode(patient_id)
        );
        let rows: Vec<LabResult> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;
        Ok(rows)
    }
}

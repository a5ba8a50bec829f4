use anyhow::{anyhow, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

pub struct SupabaseClient {
    client: Client,
    pub base_url: String,
    anon_key: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
            service_key: config.supabase_service_key.clone(),
        }
    }

    fn get_headers(&self, api_key: &str, auth_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(api_key).unwrap());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let bearer = auth_token.unwrap_or(api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", bearer)).unwrap(),
        );

        headers
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, auth_token, body, None)
            .await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let mut headers = self.get_headers(&self.anon_key, auth_token);
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        self.send(method, path, headers, body).await
    }

    /// Request authenticated with the service-role key. Server-side only;
    /// used for identity resolution and storage writes that bypass RLS.
    pub async fn service_request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        if self.service_key.is_empty() {
            return Err(anyhow!("Service role key is not configured"));
        }

        let mut headers = self.get_headers(&self.service_key, None);
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        self.send(method, path, headers, body).await
    }

    async fn send<T>(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<Value>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("Resource not found: {}", error_text),
                409 => anyhow!("Conflict: {}", error_text),
                _ => anyhow!("API error ({}): {}", status, error_text),
            });
        }

        // DELETE and updates without `Prefer: return=representation` come
        // back with no body at all.
        let text = response.text().await?;
        if text.is_empty() {
            return serde_json::from_value(Value::Null)
                .or_else(|_| serde_json::from_value(Value::Array(Vec::new())))
                .map_err(|_| anyhow!("Empty response body"));
        }

        let data = serde_json::from_str(&text)?;
        Ok(data)
    }

    /// Upload raw bytes to the storage API. Returns the object path stored.
    pub async fn upload_object(
        &self,
        bucket: &str,
        object_path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, object_path);
        debug!("Uploading object to {}", url);

        let key = if self.service_key.is_empty() {
            &self.anon_key
        } else {
            &self.service_key
        };

        let response = self
            .client
            .post(&url)
            .header("apikey", key.as_str())
            .header(AUTHORIZATION, format!("Bearer {}", key))
            .header(CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("Storage upload failed ({}): {}", status, error_text);
            return Err(anyhow!("Storage upload failed: {}", error_text));
        }

        Ok(object_path.to_string())
    }

    /// Public URL for an object in a public bucket.
    pub fn get_public_url(&self, bucket: &str, object_path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url.trim_end_matches('/'),
            bucket,
            object_path
        )
    }
}

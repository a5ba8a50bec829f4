use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            supabase_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            storage_bucket: "lab_results".to_string(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "secretary".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    /// Mint an HS256 token the same way Supabase does, signed with the
    /// test secret so `validate_token` accepts it.
    pub fn create_token(user: &TestUser, secret: &str) -> String {
        let header = json!({"alg": "HS256", "typ": "JWT"});
        let claims = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "exp": (Utc::now() + Duration::hours(1)).timestamp(),
            "iat": Utc::now().timestamp(),
        });

        let header_b64 = URL_SAFE_NO_PAD.encode(header.to_string());
        let claims_b64 = URL_SAFE_NO_PAD.encode(claims.to_string());
        let signing_input = format!("{}.{}", header_b64, claims_b64);

        let mut mac =
            Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key size");
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{}.{}", signing_input, signature)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        let header = json!({"alg": "HS256", "typ": "JWT"});
        let claims = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "exp": (Utc::now() - Duration::hours(1)).timestamp(),
            "iat": (Utc::now() - Duration::hours(2)).timestamp(),
        });

        let header_b64 = URL_SAFE_NO_PAD.encode(header.to_string());
        let claims_b64 = URL_SAFE_NO_PAD.encode(claims.to_string());
        let signing_input = format!("{}.{}", header_b64, claims_b64);

        let mut mac =
            Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key size");
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{}.{}", signing_input, signature)
    }
}

/// Canned Supabase rows used by wiremock-based tests.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn patient_row(patient_id: &str, first_name: &str, last_name: &str) -> serde_json::Value {
        json!({
            "patient_id": patient_id,
            "first_name": first_name,
            "middle_name": "",
            "last_name": last_name,
            "email": format!("{}.{}@example.com", first_name.to_lowercase(), last_name.to_lowercase()),
            "phone_number": "09171234567",
            "date_of_birth": "1990-06-15",
            "gender": "Female",
            "street_address": "123 Mabini St",
            "barangay": "Barangay Uno",
            "municipal_city": "Quezon City",
            "created_at": Utc::now().to_rfc3339()
        })
    }

    pub fn queue_entry_row(
        id: i64,
        patient_id: Option<&str>,
        status: &str,
        queue_number: i32,
        priority_level: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "patient_id": patient_id,
            "temp_first_name": if patient_id.is_some() { json!(null) } else { json!("Juan") },
            "temp_middle_name": null,
            "temp_last_name": if patient_id.is_some() { json!(null) } else { json!("DelaCruz") },
            "temp_email": if patient_id.is_some() { json!(null) } else { json!("juan@example.com") },
            "temp_phone_number": if patient_id.is_some() { json!(null) } else { json!("09170000000") },
            "temp_date_of_birth": if patient_id.is_some() { json!(null) } else { json!("2000-06-15") },
            "temp_gender": null,
            "temp_street_address": null,
            "temp_barangay": null,
            "temp_municipal_city": null,
            "is_new_patient": patient_id.is_none(),
            "priority_level": priority_level,
            "complaint": "Check-up",
            "queue_number": queue_number,
            "position": null,
            "status": status,
            "created_at": Utc::now().to_rfc3339()
        })
    }

    pub fn medicine_row(id: i64, name: &str, stocks: i32) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "dosage_form": "Tablet",
            "strength": "500 mg",
            "stocks": stocks,
            "expiration_date": "2030-01-01",
            "is_active": true
        })
    }
}

use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_key: String,
    pub supabase_jwt_secret: String,
    pub storage_bucket: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            storage_bucket: env::var("SUPABASE_STORAGE_BUCKET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_STORAGE_BUCKET not set, using default");
                    "lab_results".to_string()
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    /// Identity resolution and storage uploads need the service-role key.
    pub fn is_service_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_service_key.is_empty()
    }
}

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::jwt::validate_token;

/// Middleware that validates the bearer token and stashes the caller in
/// request extensions.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::Auth("Invalid authorization header format".to_string()));
    }

    let token = &auth_value[7..];

    let user = validate_token(token, &config.supabase_jwt_secret).map_err(AppError::Auth)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

pub fn require_medical_staff(user: &User) -> Result<(), AppError> {
    if user.is_medical_staff() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Medical staff role required".to_string()))
    }
}

pub fn require_doctor(user: &User) -> Result<(), AppError> {
    if user.is_doctor() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Doctor role required".to_string()))
    }
}

pub fn require_secretary(user: &User) -> Result<(), AppError> {
    if user.is_secretary() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Secretary role required".to_string()))
    }
}

pub fn extract_user<B>(request: &Request<B>) -> Result<User, AppError> {
    request
        .extensions()
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))
}

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::{require_doctor, require_medical_staff};

use crate::models::{
    AppointmentQuery, BookAppointmentRequest, CreateReferralRequest, ReferralStatusUpdate,
};
use crate::services::booking::BookingService;
use crate::services::referral::ReferralService;

/// Website booking form. No account is required, so this stays outside the
/// auth layer.
#[axum::debug_handler]
pub async fn book_appointment(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let service = BookingService::new(&config);
    let appointment = service.book(&request, None, None).await?;

    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<Value>, AppError> {
    require_medical_staff(&user)?;

    let service = BookingService::new(&config);
    let appointments = service.list(&query, Some(auth.token())).await?;

    Ok(Json(json!({ "appointments": appointments })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    require_medical_staff(&user)?;

    let service = BookingService::new(&config);
    let detail = service.detail(id, Some(auth.token())).await?;

    Ok(Json(json!({
        "appointment": detail.appointment,
        "payment": detail.payment(),
    })))
}

#[axum::debug_handler]
pub async fn create_referral(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateReferralRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_doctor(&user)?;

    let service = ReferralService::new(&config);
    let referral = service.create(&request, &user, Some(auth.token())).await?;

    Ok((StatusCode::CREATED, Json(json!(referral))))
}

#[axum::debug_handler]
pub async fn list_referrals(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_medical_staff(&user)?;

    let service = ReferralService::new(&config);
    let referrals = service.list(&user, Some(auth.token())).await?;

    Ok(Json(json!({ "referrals": referrals })))
}

#[axum::debug_handler]
pub async fn update_referral_status(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    Json(update): Json<ReferralStatusUpdate>,
) -> Result<Json<Value>, AppError> {
    require_medical_staff(&user)?;

    let service = ReferralService::new(&config);
    let referral = service.update_status(id, &update, Some(auth.token())).await?;

    Ok(Json(json!(referral)))
}

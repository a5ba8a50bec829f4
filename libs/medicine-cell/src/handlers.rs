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
use shared_utils::extractor::{require_medical_staff, require_secretary};

use crate::models::{DispenseRequest, MedicineListQuery, MedicineSearchQuery, MedicineWrite};
use crate::services::dispense::DispenseService;
use crate::services::forecast::ForecastService;
use crate::services::inventory::InventoryService;

#[axum::debug_handler]
pub async fn list_medicines(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<MedicineListQuery>,
) -> Result<Json<Value>, AppError> {
    require_medical_staff(&user)?;

    let service = InventoryService::new(&config);
    let medicines = service
        .list(query.show_archived.unwrap_or(false), Some(auth.token()))
        .await?;

    Ok(Json(json!({ "medicine": medicines })))
}

#[axum::debug_handler]
pub async fn list_archived_medicines(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_medical_staff(&user)?;

    let service = InventoryService::new(&config);
    let medicines = service.archived(Some(auth.token())).await?;

    Ok(Json(json!({ "medicine": medicines })))
}

#[axum::debug_handler]
pub async fn search_medicines(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<MedicineSearchQuery>,
) -> Result<Json<Value>, AppError> {
    require_medical_staff(&user)?;

    let service = InventoryService::new(&config);
    let medicines = service
        .search(query.q.as_deref().unwrap_or(""), Some(auth.token()))
        .await?;

    Ok(Json(json!({ "medicine": medicines })))
}

#[axum::debug_handler]
pub async fn get_medicine(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    require_medical_staff(&user)?;

    let service = InventoryService::new(&config);
    let medicine = service.get(id, Some(auth.token())).await?;

    Ok(Json(json!(medicine)))
}

#[axum::debug_handler]
pub async fn create_medicine(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<MedicineWrite>,
) -> Result<impl IntoResponse, AppError> {
    require_secretary(&user)?;

    let service = InventoryService::new(&config);
    let medicine = service.create(&request, Some(auth.token())).await?;

    Ok((StatusCode::CREATED, Json(json!(medicine))))
}

#[axum::debug_handler]
pub async fn update_medicine(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    Json(request): Json<MedicineWrite>,
) -> Result<Json<Value>, AppError> {
    require_secretary(&user)?;

    let service = InventoryService::new(&config);
    let medicine = service.update(id, &request, Some(auth.token())).await?;

    Ok(Json(json!(medicine)))
}

#[axum::debug_handler]
pub async fn archive_medicine(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    require_secretary(&user)?;

    let service = InventoryService::new(&config);
    service.set_archived(id, true, Some(auth.token())).await?;

    Ok(Json(json!({ "status": "medicine archived" })))
}

#[axum::debug_handler]
pub async fn unarchive_medicine(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    require_secretary(&user)?;

    let service = InventoryService::new(&config);
    service.set_archived(id, false, Some(auth.token())).await?;

    Ok(Json(json!({ "status": "medicine unarchived" })))
}

/// Per-item validation failures come back in the response body with a 400,
/// but items that passed have already been deducted.
#[axum::debug_handler]
pub async fn confirm_dispense(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<DispenseRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_secretary(&user)?;

    let service = DispenseService::new(&config);
    let errors = service.confirm(&request, Some(auth.token())).await?;

    if errors.is_empty() {
        Ok((
            StatusCode::OK,
            Json(json!({ "message": "All stocks updated successfully." })),
        ))
    } else {
        Ok((StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))))
    }
}

#[axum::debug_handler]
pub async fn predict_demand(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_medical_staff(&user)?;

    let service = ForecastService::new(&config);
    let results = service.predict(Some(auth.token())).await?;

    Ok(Json(json!({ "results": results })))
}

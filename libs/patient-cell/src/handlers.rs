use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::{require_doctor, require_medical_staff, require_secretary};

use crate::models::{
    CreateLabRequestRequest, LabResultUpload, PatientSearchQuery, ReportQuery,
    UpdatePatientRequest,
};
use crate::services::labs::LabService;
use crate::services::patient::PatientService;
use crate::services::reports::ReportService;

#[axum::debug_handler]
pub async fn list_patients(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_medical_staff(&user)?;

    let service = PatientService::new(&config);
    let patients = service.directory(&user, false, Some(auth.token())).await?;

    Ok(Json(json!({ "patients": patients })))
}

/// Same view as the directory but keeps patients still in Waiting, for the
/// whole-flow board.
#[axum::debug_handler]
pub async fn patient_flow(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_medical_staff(&user)?;

    let service = PatientService::new(&config);
    let patients = service.directory(&user, true, Some(auth.token())).await?;

    Ok(Json(json!({ "patients": patients })))
}

#[axum::debug_handler]
pub async fn get_patient_info(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_medical_staff(&user)?;

    let service = PatientService::new(&config);
    let info = service.get_info(&patient_id, Some(auth.token())).await?;

    Ok(Json(json!(info)))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    require_medical_staff(&user)?;

    let service = PatientService::new(&config);
    let patient = service
        .update(&patient_id, &request, Some(auth.token()))
        .await?;

    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn search_patients(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<PatientSearchQuery>,
) -> Result<Json<Value>, AppError> {
    require_medical_staff(&user)?;

    let service = PatientService::new(&config);
    let patients = service
        .search(query.q.as_deref().unwrap_or(""), Some(auth.token()))
        .await?;

    Ok(Json(json!({ "patients": patients })))
}

#[axum::debug_handler]
pub async fn create_lab_request(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateLabRequestRequest>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&user)?;

    let service = LabService::new(&config);
    let lab_request = service
        .create_request(&request, &user, Some(auth.token()))
        .await?;

    Ok(Json(json!(lab_request)))
}

#[axum::debug_handler]
pub async fn list_pending_lab_requests(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_medical_staff(&user)?;

    let service = LabService::new(&config);
    let requests = service.pending_requests(Some(auth.token())).await?;

    Ok(Json(json!({ "lab_requests": requests })))
}

#[axum::debug_handler]
pub async fn upload_lab_result(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(upload): Json<LabResultUpload>,
) -> Result<Json<Value>, AppError> {
    require_secretary(&user)?;

    let service = LabService::new(&config);
    let result = service.upload_result(&upload, Some(auth.token())).await?;

    Ok(Json(json!(result)))
}

#[axum::debug_handler]
pub async fn list_lab_results(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_medical_staff(&user)?;

    let service = LabService::new(&config);
    let results = service.results_for(&patient_id, Some(auth.token())).await?;

    Ok(Json(json!({ "lab_results": results })))
}

#[axum::debug_handler]
pub async fn visits_report(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Value>, AppError> {
    require_medical_staff(&user)?;

    let service = ReportService::new(&config);
    let report = service.visit_report(&query, Some(auth.token())).await?;

    Ok(Json(json!(report)))
}

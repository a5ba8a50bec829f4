use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::{
    create_lab_request, get_patient_info, list_lab_results, list_patients,
    list_pending_lab_requests, patient_flow, search_patients, update_patient, upload_lab_result,
    visits_report,
};

pub fn create_patient_router(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(list_patients))
        .route("/flow", get(patient_flow))
        .route("/search", get(search_patients))
        .route("/reports/visits", get(visits_report))
        .route("/lab-requests", post(create_lab_request).get(list_pending_lab_requests))
        .route("/lab-results", post(upload_lab_result))
        .route("/{patient_id}", get(get_patient_info).patch(update_patient))
        .route("/{patient_id}/lab-results", get(list_lab_results))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}

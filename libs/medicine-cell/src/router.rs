use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::{
    archive_medicine, confirm_dispense, create_medicine, get_medicine, list_archived_medicines,
    list_medicines, predict_demand, search_medicines, unarchive_medicine, update_medicine,
};

pub fn create_medicine_router(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", get(list_medicines).post(create_medicine))
        .route("/archived", get(list_archived_medicines))
        .route("/search", get(search_medicines))
        .route("/predict", get(predict_demand))
        .route("/dispense", post(confirm_dispense))
        .route("/{id}", get(get_medicine).put(update_medicine))
        .route("/{id}/archive", post(archive_medicine))
        .route("/{id}/unarchive", post(unarchive_medicine))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}

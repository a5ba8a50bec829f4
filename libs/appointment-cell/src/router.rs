use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::{
    book_appointment, create_referral, get_appointment, list_appointments, list_referrals,
    update_referral_status,
};

pub fn create_appointment_router(config: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/book", post(book_appointment))
        .with_state(config.clone());

    let protected_routes = Router::new()
        .route("/", get(list_appointments))
        .route("/referrals", post(create_referral).get(list_referrals))
        .route("/referrals/{id}/status", patch(update_referral_status))
        .route("/{id}", get(get_appointment))
        .layer(middleware::from_fn_with_state(
            config.clone(),
            auth_middleware,
        ))
        .with_state(config);

    public_routes.merge(protected_routes)
}

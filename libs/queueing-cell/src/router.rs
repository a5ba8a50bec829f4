use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers::{
    accept_patient, complete_treatment, get_complaint, get_snapshot, queue_websocket,
    register_queue, save_treatment,
};
use crate::QueueState;

pub fn create_queueing_router(state: Arc<QueueState>) -> Router {
    let public_routes = Router::new()
        .route("/register", post(register_queue))
        .route("/ws", get(queue_websocket));

    let protected_routes = Router::new()
        .route("/accept", post(accept_patient))
        .route("/save", post(save_treatment))
        .route("/complete", post(complete_treatment))
        .route("/snapshot", get(get_snapshot))
        .route("/complaint", get(get_complaint))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

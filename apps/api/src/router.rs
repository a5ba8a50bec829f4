use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::create_appointment_router;
use medicine_cell::create_medicine_router;
use patient_cell::create_patient_router;
use queueing_cell::{create_queueing_router, QueueState};
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    let queue_state = Arc::new(QueueState::new(state.clone()));

    Router::new()
        .route("/", get(|| async { "Clinic API is running!" }))
        .nest("/queueing", create_queueing_router(queue_state))
        .nest("/patients", create_patient_router(state.clone()))
        .nest("/medicine", create_medicine_router(state.clone()))
        .nest("/appointments", create_appointment_router(state))
}

use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{Extension, Query, State},
    response::IntoResponse,
    Json,
};
use axum_extra::TypedHeader;
use futures::{SinkExt, StreamExt};
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::{require_doctor, require_medical_staff};

use crate::models::{AcceptRequest, ComplaintQuery, RegisterQueueRequest, SaveTreatmentRequest};
use crate::services::lifecycle::LifecycleService;
use crate::services::registration::RegistrationService;
use crate::services::snapshot::SnapshotService;
use crate::QueueState;

/// Public intake endpoint: the kiosk and the website both post here, so no
/// account is required.
pub async fn register_queue(
    State(state): State<Arc<QueueState>>,
    Json(request): Json<RegisterQueueRequest>,
) -> Result<Json<Value>, AppError> {
    let service = RegistrationService::new(&state.config);
    let entry = service.register(&request, &state.assign_lock).await?;

    // New arrival changes the display; push it out without failing the
    // registration when the refresh does not work.
    let snapshot_service = SnapshotService::new(&state.config);
    match snapshot_service.compute_snapshot(None).await {
        Ok(snapshot) => state.events.publish(&snapshot),
        Err(e) => warn!("Snapshot refresh after registration failed: {}", e),
    }

    Ok(Json(json!({
        "success": true,
        "queue_entry": entry,
    })))
}

#[axum::debug_handler]
pub async fn accept_patient(
    State(state): State<Arc<QueueState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<AcceptRequest>,
) -> Result<Json<Value>, AppError> {
    require_medical_staff(&user)?;
    info!("Accept request from user {}", user.id);

    let service = LifecycleService::new(&state.config, state.events.clone());
    let entry = service.advance(&request, Some(auth.token())).await?;

    Ok(Json(json!({
        "success": true,
        "queue_entry": entry,
    })))
}

#[axum::debug_handler]
pub async fn save_treatment(
    State(state): State<Arc<QueueState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<SaveTreatmentRequest>,
) -> Result<Json<Value>, AppError> {
    require_doctor(&user)?;

    let service = LifecycleService::new(&state.config, state.events.clone());
    let entry = service
        .mark_ongoing_treatment(&request.patient_id, Some(auth.token()))
        .await?;

    Ok(Json(json!({
        "success": true,
        "queue_entry": entry,
    })))
}

#[axum::debug_handler]
pub async fn complete_treatment(
    State(state): State<Arc<QueueState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<SaveTreatmentRequest>,
) -> Result<Json<Value>, AppError> {
    require_medical_staff(&user)?;

    let service = LifecycleService::new(&state.config, state.events.clone());
    let entry = service
        .complete(&request.patient_id, Some(auth.token()))
        .await?;

    Ok(Json(json!({
        "success": true,
        "queue_entry": entry,
    })))
}

#[axum::debug_handler]
pub async fn get_snapshot(
    State(state): State<Arc<QueueState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_medical_staff(&user)?;

    let service = SnapshotService::new(&state.config);
    let snapshot = service
        .compute_snapshot(Some(auth.token()))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(Json(json!(snapshot)))
}

#[axum::debug_handler]
pub async fn get_complaint(
    State(state): State<Arc<QueueState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Query(query): Query<ComplaintQuery>,
) -> Result<Json<Value>, AppError> {
    require_medical_staff(&user)?;

    let patient_id = query
        .patient_id
        .ok_or_else(|| AppError::BadRequest("patient_id is required".to_string()))?;

    let service = LifecycleService::new(&state.config, state.events.clone());
    let complaint = service
        .latest_complaint(&patient_id, Some(auth.token()))
        .await?;

    Ok(Json(json!({ "complaint": complaint })))
}

/// Display clients connect here. Each socket gets the current snapshot on
/// connect and every published update afterwards.
pub async fn queue_websocket(
    State(state): State<Arc<QueueState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<QueueState>) {
    let (mut sink, mut stream) = socket.split();
    let mut events = state.events.subscribe();
    debug!("Queue display connected, {} subscriber(s)", state.events.subscriber_count());

    let snapshot_service = SnapshotService::new(&state.config);
    if let Ok(snapshot) = snapshot_service.compute_snapshot(None).await {
        let payload = json!({
            "type": "queue_update",
            "group": crate::services::broadcast::REGISTRATION_QUEUE_GROUP,
            "data": snapshot,
        })
        .to_string();
        if sink.send(Message::Text(payload.into())).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            update = events.recv() => {
                match update {
                    Ok(payload) => {
                        if sink.send(Message::Text(payload.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        // Lagged receivers rejoin at the next update.
                        debug!("Queue event receiver lagged by {}", skipped);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("WebSocket receive error: {}", e);
                        break;
                    }
                }
            }
        }
    }
}

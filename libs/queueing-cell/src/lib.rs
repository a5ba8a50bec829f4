pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::*;
pub use models::*;
pub use router::create_queueing_router;

use std::sync::Arc;

use tokio::sync::Mutex;

use shared_config::AppConfig;

use crate::services::broadcast::QueueBroadcast;

/// Shared state for the queueing cell. Besides the configuration it carries
/// the live-update channel and the lock that serializes queue-number
/// assignment within this process.
pub struct QueueState {
    pub config: Arc<AppConfig>,
    pub events: QueueBroadcast,
    pub assign_lock: Arc<Mutex<()>>,
}

impl QueueState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            events: QueueBroadcast::new(),
            assign_lock: Arc::new(Mutex::new(())),
        }
    }
}

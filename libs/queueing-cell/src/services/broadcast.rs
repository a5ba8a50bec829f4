use serde_json::json;
use tokio::sync::broadcast;
use tracing::debug;

use crate::models::QueueSnapshot;

pub const REGISTRATION_QUEUE_GROUP: &str = "registration_queue";

pub type QueueEventReceiver = broadcast::Receiver<String>;

/// Fan-out channel for snapshot updates to front-desk display clients.
/// Publishing never blocks and never fails the triggering request: a send
/// with no subscribers is simply dropped.
#[derive(Clone)]
pub struct QueueBroadcast {
    sender: broadcast::Sender<String>,
}

impl QueueBroadcast {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    pub fn publish(&self, snapshot: &QueueSnapshot) {
        let payload = json!({
            "type": "queue_update",
            "group": REGISTRATION_QUEUE_GROUP,
            "data": snapshot,
        })
        .to_string();

        if let Err(e) = self.sender.send(payload) {
            debug!("No active snapshot subscribers: {}", e);
        }
    }

    pub fn subscribe(&self) -> QueueEventReceiver {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for QueueBroadcast {
    fn default() -> Self {
        Self::new()
    }
}

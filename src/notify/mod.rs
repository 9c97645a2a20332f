pub mod handlers;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, error};

use crate::ingredients::repo_types::Ingredient;
use crate::inventory::ServingLog;

/// Payload pushed to every live subscriber: `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Event {
    IngredientUpdated(Ingredient),
    MealServed(ServingLog),
}

/// Fan-out of serialized events to WebSocket clients.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<String>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Fire-and-forget; failures are logged and never reach the caller.
    pub fn publish(&self, event: &Event) {
        let payload = match serde_json::to_string(event) {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "serialize event failed");
                return;
            }
        };
        match self.tx.send(payload) {
            Ok(n) => debug!(subscribers = n, "event published"),
            Err(_) => debug!("event dropped: no subscribers"),
        }
    }
}

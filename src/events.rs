use serde::Serialize;
use tokio::sync::broadcast;

use crate::db::models::RescueRequest;
use crate::location::LocationSnapshot;

/// Notifications pushed to UI collaborators: the map renderer recenters on
/// every `LocationChanged`, and the share-message composer reformats on it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum AppEvent {
    LocationChanged { snapshot: LocationSnapshot },
    LocationError { message: String },
    RequestSaved { request: RescueRequest },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    /// Emitting with no subscribers is not an error.
    pub fn emit(&self, event: AppEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

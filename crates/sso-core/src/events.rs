//! Session revocation events

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationScope {
    Local,
    Global,
}

/// Published once per revoked session. `app_id` is `None` for the global
/// session itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRevoked {
    pub user_id: String,
    pub app_id: Option<String>,
    pub scope: RevocationScope,
}

/// Outbound notification port for relying parties affected by a logout.
pub trait SessionEventPublisher: Send + Sync {
    fn publish(&self, event: SessionRevoked);
}

/// In-process broadcast bus. Delivery is at-most-once; events published
/// without subscribers are dropped.
pub struct EventBus {
    tx: broadcast::Sender<SessionRevoked>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionRevoked> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl SessionEventPublisher for EventBus {
    fn publish(&self, event: SessionRevoked) {
        if let Err(e) = self.tx.send(event) {
            debug!("No subscribers for session event: {:?}", e.0);
        }
    }
}

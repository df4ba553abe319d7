//! Periodic session re-validation

use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use sso_shared::constants::SESSION_CHECK_INTERVAL_SECONDS;

use crate::client::SsoClient;

/// Re-reads the stored session on a timer so subscribers see expiry.
/// Dropping the watcher stops it; it never triggers a refresh.
pub struct SessionWatcher {
    handle: JoinHandle<()>,
}

impl SessionWatcher {
    pub fn spawn(client: &Arc<SsoClient>) -> Self {
        Self::spawn_every(client, Duration::from_secs(SESSION_CHECK_INTERVAL_SECONDS))
    }

    pub fn spawn_every(client: &Arc<SsoClient>, every: Duration) -> Self {
        let client: Weak<SsoClient> = Arc::downgrade(client);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let Some(client) = client.upgrade() else {
                    debug!("Client dropped, session watcher exiting");
                    break;
                };
                client.check_session();
            }
        });
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for SessionWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

//! Full-page navigation seam

use tokio::sync::mpsc;
use tracing::warn;
use url::Url;

/// Host UI hook that leaves the current page for `url`.
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &Url);
}

/// Forwards navigation targets to whoever owns the receiver.
#[derive(Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<Url>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Url>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, url: &Url) {
        if self.tx.send(url.clone()).is_err() {
            warn!(url = %url, "Navigation dropped, receiver is gone");
        }
    }
}

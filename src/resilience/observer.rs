//! Retry notifications
//!
//! The retry loop only emits [`RetryEvent`]s; delivery is up to the observer.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::warn;

/// Emitted before each backoff sleep
#[derive(Debug, Clone, PartialEq)]
pub struct RetryEvent {
    /// 1-based number of the retry about to happen
    pub attempt: u32,
    pub delay: Duration,
    /// Message of the failure that triggered the retry
    pub error: String,
}

/// Receives retry notifications; must not block
pub trait RetryObserver: Send + Sync {
    fn on_retry(&self, event: &RetryEvent);
}

impl<F> RetryObserver for F
where
    F: Fn(&RetryEvent) + Send + Sync,
{
    fn on_retry(&self, event: &RetryEvent) {
        self(event)
    }
}

/// Forwards retry events into a bounded channel.
///
/// Events are dropped (and logged) when the receiver lags or is gone, so a
/// slow consumer never stalls the retry loop.
pub struct ChannelObserver {
    sender: mpsc::Sender<RetryEvent>,
}

impl ChannelObserver {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<RetryEvent>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (Self { sender }, receiver)
    }
}

impl RetryObserver for ChannelObserver {
    fn on_retry(&self, event: &RetryEvent) {
        if let Err(e) = self.sender.try_send(event.clone()) {
            match e {
                mpsc::error::TrySendError::Full(event) => {
                    warn!(attempt = event.attempt, "Retry event channel full, dropping event");
                }
                mpsc::error::TrySendError::Closed(_) => {}
            }
        }
    }
}

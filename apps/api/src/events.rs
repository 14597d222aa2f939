//! Process-scoped registry of open real-time connections.
//!
//! Wraps a `tokio::sync::broadcast` channel: a connection registers by
//! subscribing and is pruned automatically when its receiver drops on close
//! or send error. Publishing is fire-and-forget; with no subscribers the
//! event is dropped, and a slow subscriber that lags loses events instead of
//! blocking the sender.

use leadflow_application::{ChangeEvent, ChangeNotifier};
use tokio::sync::broadcast;

/// Buffered events per connection before a slow listener starts lagging.
const CHANNEL_CAPACITY: usize = 256;

/// Broadcast hub injected into the mutation path as the `ChangeNotifier`
/// port and into the WebSocket handler as the subscription source.
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<ChangeEvent>,
}

impl EventBroadcaster {
    /// Creates a broadcaster with the default per-connection buffer.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Registers a new connection; each subscriber gets an independent
    /// ordered stream.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of currently open connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier for EventBroadcaster {
    fn publish(&self, event: ChangeEvent) {
        let connections = self.sender.receiver_count();
        tracing::debug!(connections, "broadcasting change event");
        // A send error just means nobody is listening.
        let _ = self.sender.send(event);
    }
}

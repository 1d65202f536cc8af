//! Event bus seam.
//!
//! The core only ever writes to the bus; delivery, fan-out, and
//! persistence are the host's concern.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use relaykit_a2a::A2aEvent;

/// Publish-only sink for protocol events. No read-back, no
/// acknowledgment contract.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish one event. Must not fail the task lifecycle; delivery
    /// problems are the implementation's to absorb.
    async fn publish(&self, event: A2aEvent);
}

/// Event bus backed by a tokio broadcast channel.
///
/// Subscribers that lag past the channel capacity lose the oldest events;
/// the publisher is never blocked.
#[derive(Debug, Clone)]
pub struct BroadcastBus {
    tx: broadcast::Sender<A2aEvent>,
}

impl BroadcastBus {
    /// Create a bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<A2aEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl EventBus for BroadcastBus {
    async fn publish(&self, event: A2aEvent) {
        // A send error only means there are no subscribers right now.
        if self.tx.send(event).is_err() {
            debug!("Published event with no active subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaykit_a2a::Message;

    #[tokio::test]
    async fn test_broadcast_delivery() {
        let bus = BroadcastBus::new(8);
        let mut rx = bus.subscribe();

        let event = A2aEvent::Message(Message::agent("hello"));
        bus.publish(event.clone()).await;

        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = BroadcastBus::new(8);
        // Must not panic or error.
        bus.publish(A2aEvent::Message(Message::agent("nobody home")))
            .await;
    }
}

use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use super::events::RoomEvent;

/// Per-subscriber buffer size. A subscriber that falls this far behind is
/// disconnected rather than allowed to stall the publisher or grow memory.
const SUBSCRIBER_BUFFER: usize = 64;

/// Error returned when subscribing to a bus that has been closed
#[derive(Debug, Error)]
#[error("event bus is closed")]
pub struct BusClosed;

/// In-process multicast for a single room's domain events
///
/// Every open event stream holds one `RoomSubscription`. Publishing never
/// blocks: delivery uses bounded channels with a disconnect-on-overflow
/// policy, so a slow consumer only ever hurts itself.
#[derive(Debug)]
pub struct EventBus {
    inner: Mutex<BusInner>,
}

#[derive(Debug)]
struct BusInner {
    subscribers: Vec<mpsc::Sender<RoomEvent>>,
    closed: bool,
}

/// Receiving half of a bus subscription; dropped on disconnect
#[derive(Debug)]
pub struct RoomSubscription {
    receiver: mpsc::Receiver<RoomEvent>,
}

impl RoomSubscription {
    /// Receives the next event, or `None` once the bus is closed
    pub async fn recv(&mut self) -> Option<RoomEvent> {
        self.receiver.recv().await
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BusInner {
                subscribers: Vec::new(),
                closed: false,
            }),
        }
    }

    /// Registers a new subscriber; it receives all events published after
    /// this call (no replay — the caller fetches an initial snapshot itself)
    pub fn subscribe(&self) -> Result<RoomSubscription, BusClosed> {
        let mut inner = self.inner.lock().unwrap();
        if inner.closed {
            return Err(BusClosed);
        }

        let (sender, receiver) = mpsc::channel(SUBSCRIBER_BUFFER);
        inner.subscribers.push(sender);

        Ok(RoomSubscription { receiver })
    }

    /// Delivers an event to all current subscribers
    ///
    /// Subscribers whose buffer is full or whose receiving half is gone are
    /// dropped from the list.
    pub fn publish(&self, event: RoomEvent) {
        let mut inner = self.inner.lock().unwrap();
        if inner.closed {
            debug!(event = event.event_type(), "Dropping event on closed bus");
            return;
        }

        inner.subscribers.retain(|sender| {
            match sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        event = event.event_type(),
                        "Subscriber buffer full, disconnecting slow subscriber"
                    );
                    false
                }
                Err(TrySendError::Closed(_)) => false,
            }
        });
    }

    /// Whether any live subscriber exists (used for empty-room detection)
    pub fn has_subscribers(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner.subscribers.retain(|sender| !sender.is_closed());
        !inner.subscribers.is_empty()
    }

    /// Ends all subscriptions and rejects further subscribe/publish calls
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.closed = true;
        inner.subscribers.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::models::Ticket;

    #[tokio::test]
    async fn test_subscriber_receives_published_events() {
        let bus = EventBus::new();
        let mut subscription = bus.subscribe().unwrap();

        bus.publish(RoomEvent::Reveal);

        let event = subscription.recv().await.unwrap();
        assert_eq!(event.event_type(), "Reveal");
    }

    #[tokio::test]
    async fn test_no_replay_of_events_before_subscribe() {
        let bus = EventBus::new();
        bus.publish(RoomEvent::Reveal);

        let mut subscription = bus.subscribe().unwrap();
        bus.publish(RoomEvent::NextRound(Ticket::empty()));

        let event = subscription.recv().await.unwrap();
        assert_eq!(event.event_type(), "NextRound");
    }

    #[tokio::test]
    async fn test_multiple_subscribers_all_receive() {
        let bus = EventBus::new();
        let mut first = bus.subscribe().unwrap();
        let mut second = bus.subscribe().unwrap();

        bus.publish(RoomEvent::Reveal);

        assert_eq!(first.recv().await.unwrap().event_type(), "Reveal");
        assert_eq!(second.recv().await.unwrap().event_type(), "Reveal");
    }

    #[tokio::test]
    async fn test_has_subscribers_tracks_live_connections() {
        let bus = EventBus::new();
        assert!(!bus.has_subscribers());

        let subscription = bus.subscribe().unwrap();
        assert!(bus.has_subscribers());

        drop(subscription);
        assert!(!bus.has_subscribers());
    }

    #[tokio::test]
    async fn test_slow_subscriber_is_disconnected_not_blocking() {
        let bus = EventBus::new();
        let mut slow = bus.subscribe().unwrap();

        // Overflow the bounded buffer; publish must never block.
        for _ in 0..(SUBSCRIBER_BUFFER + 10) {
            bus.publish(RoomEvent::Reveal);
        }

        assert!(!bus.has_subscribers());

        // The slow subscriber drains what was buffered, then ends.
        let mut received = 0;
        while slow.recv().await.is_some() {
            received += 1;
        }
        assert_eq!(received, SUBSCRIBER_BUFFER);
    }

    #[tokio::test]
    async fn test_close_ends_subscriptions_and_rejects_new_ones() {
        let bus = EventBus::new();
        let mut subscription = bus.subscribe().unwrap();

        bus.close();

        assert!(subscription.recv().await.is_none());
        assert!(bus.subscribe().is_err());
        assert!(!bus.has_subscribers());
    }

    #[tokio::test]
    async fn test_publish_after_close_is_dropped() {
        let bus = EventBus::new();
        bus.close();

        // Must not panic or deliver anywhere.
        bus.publish(RoomEvent::Reveal);
    }
}

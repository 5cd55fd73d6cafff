//! In-process event bus backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use glowhub_domain::event::HubEvent;

use crate::ports::EventPublisher;

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped). Slow subscribers lag instead of blocking
/// the publisher.
pub struct InProcessEventBus {
    sender: broadcast::Sender<HubEvent>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events on this bus.
    ///
    /// Returns a receiver that will get all events published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: HubEvent) -> impl Future<Output = ()> + Send {
        // Only fails when nobody is subscribed.
        let _ = self.sender.send(event);
        async {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glowhub_domain::id::{DeviceAddress, GroupKey};

    fn offline(mac: &str) -> HubEvent {
        HubEvent::LightOffline {
            address: DeviceAddress::from_mac(mac),
        }
    }

    #[tokio::test]
    async fn should_deliver_event_to_subscriber() {
        let bus = InProcessEventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(offline("aa")).await;

        assert_eq!(rx.recv().await.unwrap(), offline("aa"));
    }

    #[tokio::test]
    async fn should_deliver_event_to_multiple_subscribers() {
        let bus = InProcessEventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        let event = HubEvent::GroupChanged {
            key: GroupKey::from_label("Office"),
            members: 2,
        };

        bus.publish(event.clone()).await;

        assert_eq!(rx1.recv().await.unwrap(), event);
        assert_eq!(rx2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn should_not_block_when_no_subscribers() {
        let bus = InProcessEventBus::new(1);
        bus.publish(offline("aa")).await;
        bus.publish(offline("bb")).await;
    }

    #[tokio::test]
    async fn should_not_deliver_events_published_before_subscription() {
        let bus = InProcessEventBus::new(16);
        bus.publish(offline("aa")).await;

        let mut rx = bus.subscribe();
        bus.publish(offline("bb")).await;

        assert_eq!(rx.recv().await.unwrap(), offline("bb"));
    }
}

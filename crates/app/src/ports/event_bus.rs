//! Event bus port — how state-change notifications reach the protocol adapter.

use std::future::Future;

use glowhub_domain::event::HubEvent;

/// Publishes hub events to interested subscribers.
///
/// Publishing is fire-and-forget: a subscriber that is gone or lagging must
/// never hold up the core.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: HubEvent) -> impl Future<Output = ()> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: HubEvent) -> impl Future<Output = ()> + Send {
        (**self).publish(event)
    }
}

//! Periodic reconciliation of every light and of group membership.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ports::{EventPublisher, Transport};
use crate::services::discovery_service::DiscoveryService;
use crate::services::reconcile_service::Reconciler;

pub struct Poller;

impl Poller {
    /// Refresh membership and sweep every light now, then once per
    /// `interval`, until the returned handle is aborted.
    ///
    /// A failed membership refresh is logged and the sweep still runs.
    pub fn start<T, P>(
        discovery: Arc<DiscoveryService<T>>,
        reconciler: Arc<Reconciler<P>>,
        interval: Duration,
    ) -> JoinHandle<()>
    where
        T: Transport,
        P: EventPublisher + Send + Sync + 'static,
    {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(err) = discovery.discover().await {
                    tracing::warn!(%err, "membership refresh failed");
                }
                let report = reconciler.reconcile_all().await;
                tracing::debug!(
                    refreshed = report.refreshed,
                    unreachable = report.unreachable,
                    "poll sweep finished"
                );
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medium::SharedMedium;
    use crate::queue::{CommandQueue, Worker};
    use crate::registry::LightRegistry;
    use crate::testing::{FakeTransport, RecordingPublisher};
    use glowhub_domain::color::{ColorState, Hsbk};
    use glowhub_domain::event::HubEvent;
    use glowhub_domain::id::{DeviceAddress, GroupKey};
    use glowhub_domain::light::LightDevice;

    #[tokio::test]
    async fn should_sweep_repeatedly_until_aborted() {
        let address = DeviceAddress::from_mac("aa");
        let fake = FakeTransport::default();
        fake.add_light(&address, ColorState::Single(Hsbk::default()));
        let registry = LightRegistry::new();
        registry
            .insert_light(
                LightDevice::builder()
                    .address(address)
                    .label("Porch")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let publisher = RecordingPublisher::default();
        let (queue, receiver) = CommandQueue::channel();
        Worker::new(
            receiver,
            SharedMedium::new(fake.clone(), Duration::from_secs(1)),
            registry.clone(),
            publisher.clone(),
        )
        .spawn();
        let discovery = Arc::new(DiscoveryService::new(
            SharedMedium::new(fake, Duration::from_secs(1)),
            registry.clone(),
        ));
        let reconciler = Arc::new(Reconciler::new(queue, registry, publisher.clone()));

        let handle = Poller::start(discovery, reconciler, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(55)).await;
        handle.abort();

        let sweeps = publisher
            .events()
            .iter()
            .filter(|e| matches!(e, HubEvent::LightChanged(_)))
            .count();
        assert!(sweeps >= 2, "expected several sweeps, got {sweeps}");
    }

    #[tokio::test]
    async fn should_refresh_group_membership_on_each_sweep() {
        let fake = FakeTransport::default();
        fake.announce("aa", "Office", None);
        let registry = LightRegistry::new();
        let (queue, receiver) = CommandQueue::channel();
        Worker::new(
            receiver,
            SharedMedium::new(fake.clone(), Duration::from_secs(1)),
            registry.clone(),
            RecordingPublisher::default(),
        )
        .spawn();
        let discovery = Arc::new(DiscoveryService::new(
            SharedMedium::new(fake.clone(), Duration::from_secs(1)),
            registry.clone(),
        ));
        let reconciler = Arc::new(Reconciler::new(
            queue,
            registry.clone(),
            RecordingPublisher::default(),
        ));
        discovery.discover().await.unwrap();

        fake.announce("aa", "Kitchen", None);
        let handle = Poller::start(discovery, reconciler, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(35)).await;
        handle.abort();

        assert_eq!(
            registry.members(&GroupKey::from_label("Kitchen")).unwrap(),
            vec![DeviceAddress::from_mac("aa")]
        );
        assert!(registry
            .members(&GroupKey::from_label("Office"))
            .unwrap()
            .is_empty());
    }
}

//! Reconciliation — refresh the mirror from what the lights report.
//!
//! Reads are queued behind any pending writes and performed by the queue
//! worker, so a poll can never report colors older than a write already
//! accepted.

use std::time::Duration;

use glowhub_domain::color::ColorState;
use glowhub_domain::error::{GlowHubError, TransportError};
use glowhub_domain::event::HubEvent;
use glowhub_domain::id::DeviceAddress;
use glowhub_domain::light::{PollFailure, PollReading};
use glowhub_domain::time::{Timestamp, now};

use crate::medium::{MediumGuard, SharedMedium};
use crate::ports::{EventPublisher, Transport};
use crate::queue::CommandQueue;
use crate::registry::LightRegistry;

/// Result of one poll of one light.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The light answered; `colors_applied` is false while an edit is staged.
    Refreshed { colors_applied: bool },
    Transient { attempts: u32 },
    WentOffline,
    StillOffline,
}

/// Tally of one sweep over every light.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub refreshed: usize,
    pub unreachable: usize,
}

/// Queues polls and waits for the worker to fold their readings into the
/// registry.
pub struct Reconciler<P> {
    queue: CommandQueue,
    registry: LightRegistry,
    publisher: P,
}

impl<P: EventPublisher> Reconciler<P> {
    pub fn new(queue: CommandQueue, registry: LightRegistry, publisher: P) -> Self {
        Self {
            queue,
            registry,
            publisher,
        }
    }

    /// Poll one light once every write queued before it has run.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::NotFound`] for unknown addresses or
    /// [`GlowHubError::QueueClosed`] when the worker has stopped. Transport
    /// failures are absorbed into the outcome.
    pub async fn reconcile(&self, address: &DeviceAddress) -> Result<ReconcileOutcome, GlowHubError> {
        self.reconcile_at(address, now()).await
    }

    /// Poll one light, classifying the result against `at`.
    ///
    /// # Errors
    ///
    /// Same as [`reconcile`](Self::reconcile).
    pub async fn reconcile_at(
        &self,
        address: &DeviceAddress,
        at: Timestamp,
    ) -> Result<ReconcileOutcome, GlowHubError> {
        self.registry.inspect(address, |_| ())?;
        let outcome = self.queue.submit_poll(address.clone(), at)?;
        outcome.await.map_err(|_| GlowHubError::QueueClosed)?
    }

    /// Poll every registered light, then refresh group membership counts.
    pub async fn reconcile_all(&self) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for address in self.registry.addresses() {
            match self.reconcile(&address).await {
                Ok(ReconcileOutcome::Refreshed { .. }) => report.refreshed += 1,
                Ok(_) => report.unreachable += 1,
                Err(err) => tracing::debug!(address = %address, %err, "light skipped during sweep"),
            }
        }
        for group in self.registry.groups() {
            if let Ok(members) = self.registry.members(&group.key) {
                self.publisher
                    .publish(HubEvent::GroupChanged {
                        key: group.key,
                        members: members.len(),
                    })
                    .await;
            }
        }
        report
    }
}

/// Read one light under the medium lock and fold the reading into the
/// registry. Runs on the queue worker.
#[tracing::instrument(skip_all, fields(address = %address))]
pub(crate) async fn poll<T: Transport, P: EventPublisher>(
    medium: &SharedMedium<T>,
    registry: &LightRegistry,
    publisher: &P,
    address: &DeviceAddress,
    at: Timestamp,
    offline_threshold: Duration,
) -> Result<ReconcileOutcome, GlowHubError> {
    let zoned = registry.inspect(address, |light| light.colors().is_zoned())?;

    let reading = {
        let mut guard = medium.acquire().await;
        read_light(&mut guard, address, zoned).await
    };

    match reading {
        Ok(reading) => {
            let (colors_applied, state) = registry.update(address, |light| {
                let applied = light.record_poll_success(reading, at);
                (applied, light.state())
            })?;
            tracing::debug!(colors_applied, "light refreshed");
            publisher.publish(HubEvent::LightChanged(state)).await;
            Ok(ReconcileOutcome::Refreshed { colors_applied })
        }
        Err(err) => {
            let failure =
                registry.update(address, |light| light.record_poll_failure(at, offline_threshold))?;
            Ok(report_failure(publisher, address, failure, &err, offline_threshold).await)
        }
    }
}

async fn report_failure<P: EventPublisher>(
    publisher: &P,
    address: &DeviceAddress,
    failure: PollFailure,
    err: &TransportError,
    offline_threshold: Duration,
) -> ReconcileOutcome {
    match failure {
        PollFailure::Transient { attempts } => {
            tracing::warn!(attempts, %err, "poll failed");
            ReconcileOutcome::Transient { attempts }
        }
        PollFailure::WentOffline => {
            tracing::error!(
                threshold_secs = offline_threshold.as_secs(),
                %err,
                "light unreachable, marking offline"
            );
            publisher
                .publish(HubEvent::LightOffline {
                    address: address.clone(),
                })
                .await;
            ReconcileOutcome::WentOffline
        }
        PollFailure::StillOffline => {
            tracing::debug!(%err, "light still offline");
            ReconcileOutcome::StillOffline
        }
    }
}

async fn read_light<T: Transport>(
    guard: &mut MediumGuard<'_, T>,
    address: &DeviceAddress,
    zoned: bool,
) -> Result<PollReading, TransportError> {
    let power = guard.read_power(address).await?;
    let colors = if zoned {
        let zones = guard.read_zone_colors(address).await?;
        if zones.is_empty() {
            return Err(TransportError::Protocol("light reported no zones".to_string()));
        }
        ColorState::Zones(zones)
    } else {
        ColorState::Single(guard.read_color(address).await?)
    };
    let uptime = guard.read_uptime(address).await?;
    Ok(PollReading {
        power,
        colors,
        uptime,
    })
}

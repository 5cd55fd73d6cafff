//! The hub facade handed to protocol adapters.
//!
//! [`LightHub`] owns the queue worker and wires every service to the same
//! registry, queue and medium.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use glowhub_domain::color::Hsbk;
use glowhub_domain::command::{CommandKind, GroupOperation};
use glowhub_domain::error::GlowHubError;
use glowhub_domain::group::Group;
use glowhub_domain::id::{CommandId, DeviceAddress, GroupKey};
use glowhub_domain::light::LightState;
use glowhub_domain::staging::{Field, StagedSnapshot};

use crate::medium::SharedMedium;
use crate::poller::Poller;
use crate::ports::{EventPublisher, Transport};
use crate::queue::{CommandQueue, QueueStats, Worker};
use crate::registry::LightRegistry;
use crate::services::control_service::ControlService;
use crate::services::discovery_service::{DiscoveryReport, DiscoveryService};
use crate::services::edit_service::EditService;
use crate::services::group_service::GroupService;
use crate::services::reconcile_service::{ReconcileOutcome, ReconcileReport, Reconciler};

/// Tunables of the hub core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubOptions {
    /// Time without a successful read after which a light is offline.
    pub offline_threshold: Duration,
    /// Upper bound on a single transport operation.
    pub op_timeout: Duration,
}

impl Default for HubOptions {
    fn default() -> Self {
        Self {
            offline_threshold: Duration::from_secs(60),
            op_timeout: Duration::from_secs(5),
        }
    }
}

pub struct LightHub<T, P> {
    registry: LightRegistry,
    queue: CommandQueue,
    reconciler: Arc<Reconciler<Arc<P>>>,
    edits: EditService<Arc<P>>,
    control: ControlService,
    groups: GroupService,
    discovery: Arc<DiscoveryService<T>>,
    worker: JoinHandle<()>,
}

impl<T, P> LightHub<T, P>
where
    T: Transport,
    P: EventPublisher + Send + Sync + 'static,
{
    /// Take ownership of the transport and start the queue worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(transport: T, publisher: P, options: HubOptions) -> Self {
        let publisher = Arc::new(publisher);
        let registry = LightRegistry::new();
        let medium = SharedMedium::new(transport, options.op_timeout);
        let (queue, receiver) = CommandQueue::channel();
        let worker = Worker::new(
            receiver,
            medium.clone(),
            registry.clone(),
            Arc::clone(&publisher),
        )
        .with_offline_threshold(options.offline_threshold)
        .spawn();

        Self {
            reconciler: Arc::new(Reconciler::new(
                queue.clone(),
                registry.clone(),
                Arc::clone(&publisher),
            )),
            edits: EditService::new(registry.clone(), queue.clone(), publisher),
            control: ControlService::new(registry.clone(), queue.clone()),
            groups: GroupService::new(registry.clone(), queue.clone()),
            discovery: Arc::new(DiscoveryService::new(medium, registry.clone())),
            registry,
            queue,
            worker,
        }
    }

    /// Start refreshing group membership and polling every light once per
    /// `interval`.
    pub fn spawn_poller(&self, interval: Duration) -> JoinHandle<()> {
        Poller::start(
            Arc::clone(&self.discovery),
            Arc::clone(&self.reconciler),
            interval,
        )
    }

    // ── queue ─────────────────────────────────────────────────────

    /// Queue a raw command for one light.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::QueueClosed`] when the worker has stopped.
    pub fn submit(&self, address: DeviceAddress, kind: CommandKind) -> Result<CommandId, GlowHubError> {
        self.queue.submit(address, kind)
    }

    /// Queue `op` for every member of a group.
    ///
    /// # Errors
    ///
    /// See [`GroupService::group_operation`].
    pub fn submit_group(
        &self,
        key: &GroupKey,
        op: GroupOperation,
    ) -> Result<Vec<CommandId>, GlowHubError> {
        self.groups.group_operation(key, op)
    }

    /// # Errors
    ///
    /// Returns [`GlowHubError::QueueClosed`] if the worker stops first.
    pub async fn flush(&self) -> Result<(), GlowHubError> {
        self.queue.flush().await
    }

    #[must_use]
    pub fn stats(&self) -> QueueStats {
        self.queue.stats()
    }

    /// Drain the queue, then stop the worker.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::QueueClosed`] if the worker was already gone.
    pub async fn shutdown(self) -> Result<(), GlowHubError> {
        let flushed = self.queue.flush().await;
        self.worker.abort();
        tracing::info!(stats = ?self.queue.stats(), "hub stopped");
        flushed
    }

    // ── reconciliation ───────────────────────────────────────────

    /// # Errors
    ///
    /// See [`Reconciler::reconcile`].
    pub async fn reconcile(&self, address: &DeviceAddress) -> Result<ReconcileOutcome, GlowHubError> {
        self.reconciler.reconcile(address).await
    }

    pub async fn reconcile_all(&self) -> ReconcileReport {
        self.reconciler.reconcile_all().await
    }

    /// # Errors
    ///
    /// See [`DiscoveryService::discover`].
    pub async fn discover(&self) -> Result<DiscoveryReport, GlowHubError> {
        self.discovery.discover().await
    }

    // ── staged edits ─────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns [`GlowHubError::NotFound`] for unknown addresses.
    pub fn begin_or_continue_edit(
        &self,
        address: &DeviceAddress,
    ) -> Result<StagedSnapshot, GlowHubError> {
        self.edits.begin_or_continue_edit(address)
    }

    /// # Errors
    ///
    /// See [`EditService::edit_field`].
    pub fn edit_field(
        &self,
        address: &DeviceAddress,
        field: Field,
        raw: &str,
    ) -> Result<CommandId, GlowHubError> {
        self.edits.edit_field(address, field, raw)
    }

    /// # Errors
    ///
    /// See [`EditService::stage_zone_color`].
    pub fn stage_zone_color(
        &self,
        address: &DeviceAddress,
        zone: u16,
        color: Hsbk,
        raw_duration: &str,
    ) -> Result<CommandId, GlowHubError> {
        self.edits.stage_zone_color(address, zone, color, raw_duration)
    }

    /// # Errors
    ///
    /// See [`EditService::commit`].
    pub async fn commit(&self, address: &DeviceAddress) -> Result<Option<CommandId>, GlowHubError> {
        self.edits.commit(address).await
    }

    /// # Errors
    ///
    /// Returns [`GlowHubError::NotFound`] for unknown addresses.
    pub fn discard(&self, address: &DeviceAddress) -> Result<bool, GlowHubError> {
        self.edits.discard(address)
    }

    // ── direct control ───────────────────────────────────────────

    /// # Errors
    ///
    /// Returns [`GlowHubError::NotFound`] for unknown addresses.
    pub fn power_on(&self, address: &DeviceAddress) -> Result<CommandId, GlowHubError> {
        self.control.power_on(address)
    }

    /// # Errors
    ///
    /// Returns [`GlowHubError::NotFound`] for unknown addresses.
    pub fn power_off(&self, address: &DeviceAddress) -> Result<CommandId, GlowHubError> {
        self.control.power_off(address)
    }

    /// # Errors
    ///
    /// See [`ControlService::set_color`].
    pub fn set_color(
        &self,
        address: &DeviceAddress,
        color: Hsbk,
        raw_duration: &str,
    ) -> Result<CommandId, GlowHubError> {
        self.control.set_color(address, color, raw_duration)
    }

    /// # Errors
    ///
    /// See [`ControlService::set_preset`].
    pub fn set_preset(&self, address: &DeviceAddress, index: u8) -> Result<CommandId, GlowHubError> {
        self.control.set_preset(address, index)
    }

    // ── read model ───────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns [`GlowHubError::NotFound`] for unknown addresses.
    pub fn light(&self, address: &DeviceAddress) -> Result<LightState, GlowHubError> {
        self.registry.inspect(address, |light| light.state())
    }

    #[must_use]
    pub fn lights(&self) -> Vec<LightState> {
        self.registry.states()
    }

    #[must_use]
    pub fn groups(&self) -> Vec<Group> {
        self.registry.groups()
    }

    /// # Errors
    ///
    /// Returns [`GlowHubError::NotFound`] for unknown group keys.
    pub fn group_members(&self, key: &GroupKey) -> Result<Vec<DeviceAddress>, GlowHubError> {
        self.groups.members(key)
    }
}

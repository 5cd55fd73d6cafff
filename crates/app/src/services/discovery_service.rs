//! Discovery — register lights and groups found on the medium.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use glowhub_domain::error::GlowHubError;
use glowhub_domain::group::Group;
use glowhub_domain::light::LightDevice;

use crate::medium::SharedMedium;
use crate::ports::{DiscoveredLight, Transport};
use crate::registry::LightRegistry;

/// What one discovery run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub lights_added: usize,
    pub groups_added: usize,
    /// Known lights that now report a different group.
    pub lights_regrouped: usize,
}

pub struct DiscoveryService<T> {
    medium: SharedMedium<T>,
    registry: LightRegistry,
    running: Arc<AtomicBool>,
}

/// Clears the running flag when the run ends, however it ends.
struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<T: Transport> DiscoveryService<T> {
    pub fn new(medium: SharedMedium<T>, registry: LightRegistry) -> Self {
        Self {
            medium,
            registry,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Ask the medium which lights are present and register the new ones.
    ///
    /// A known light only has its group membership refreshed; its mirrored
    /// state is left untouched. A call made while another run is in progress
    /// returns an empty report at once.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::Transport`] when the discovery broadcast fails.
    #[tracing::instrument(skip(self))]
    pub async fn discover(&self) -> Result<DiscoveryReport, GlowHubError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("discovery already running");
            return Ok(DiscoveryReport::default());
        }
        let _running = RunGuard(Arc::clone(&self.running));

        let found = self.medium.acquire().await.discover().await?;

        let mut report = DiscoveryReport::default();
        for light in found {
            self.register(light, &mut report);
        }
        if report == DiscoveryReport::default() {
            tracing::debug!("discovery finished, nothing changed");
        } else {
            tracing::info!(
                lights_added = report.lights_added,
                groups_added = report.groups_added,
                lights_regrouped = report.lights_regrouped,
                "discovery finished"
            );
        }
        Ok(report)
    }

    fn register(&self, found: DiscoveredLight, report: &mut DiscoveryReport) {
        match Group::new(found.group_id.clone(), &found.group_label, found.group_updated_at) {
            Ok(group) => {
                if self.registry.insert_group(group) {
                    report.groups_added += 1;
                }
            }
            Err(err) => {
                tracing::warn!(group = %found.group_id, %err, "ignoring group with unusable label");
            }
        }

        if self.registry.contains(&found.address) {
            match self.registry.move_to_group(&found.address, found.group_id.clone()) {
                Ok(true) => {
                    tracing::info!(
                        address = %found.address,
                        group = %found.group_id,
                        "light moved to another group"
                    );
                    report.lights_regrouped += 1;
                }
                Ok(false) => {}
                Err(err) => tracing::warn!(address = %found.address, %err, "could not regroup light"),
            }
            return;
        }
        let mut builder = LightDevice::builder()
            .address(found.address.clone())
            .label(found.label)
            .group(found.group_id);
        if let Some(count) = found.zone_count {
            builder = builder.zones(count);
        }
        match builder
            .build()
            .and_then(|light| self.registry.insert_light(light))
        {
            Ok(_) => {
                tracing::info!(address = %found.address, "light added");
                report.lights_added += 1;
            }
            Err(err) => tracing::warn!(address = %found.address, %err, "ignoring discovered light"),
        }
    }
}

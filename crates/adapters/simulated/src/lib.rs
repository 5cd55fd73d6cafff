//! # glowhub-adapter-simulated
//!
//! Simulated transport that stands in for a real light network, for demos
//! and end-to-end tests.
//!
//! Every fixture keeps the state a real light would report back: power,
//! one color or one color per zone, and uptime since the transport was
//! built. Writes change that state, reads return it. A configurable latency
//! is applied to every operation, and a [`FaultInjector`] handle can make
//! individual fixtures stop answering.
//!
//! ## Dependency rule
//!
//! Depends on `glowhub-app` (port traits) and `glowhub-domain` only.

mod config;
mod error;
mod fixture;

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use glowhub_app::ports::{DiscoveredLight, Transport};
use glowhub_domain::color::{ColorState, Hsbk};
use glowhub_domain::error::TransportError;
use glowhub_domain::id::DeviceAddress;
use glowhub_domain::transition::TransitionTime;
use glowhub_domain::zone::ZoneRange;

pub use config::{SimulatedConfig, SimulatedLightConfig};
pub use error::SimulatedError;

use fixture::Fixture;

/// Handle used to make simulated fixtures unreachable at runtime.
///
/// Clones share state with the transport that produced them.
#[derive(Debug, Clone, Default)]
pub struct FaultInjector {
    unreachable: Arc<Mutex<HashSet<DeviceAddress>>>,
}

impl FaultInjector {
    /// Make `address` stop (or resume) answering every operation.
    pub fn set_unreachable(&self, address: &DeviceAddress, unreachable: bool) {
        let mut set = self
            .unreachable
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if unreachable {
            set.insert(address.clone());
        } else {
            set.remove(address);
        }
    }

    #[must_use]
    pub fn is_unreachable(&self, address: &DeviceAddress) -> bool {
        self.unreachable
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(address)
    }
}

/// In-memory light network implementing the [`Transport`] port.
pub struct SimulatedTransport {
    fixtures: BTreeMap<DeviceAddress, Fixture>,
    latency: Duration,
    faults: FaultInjector,
}

impl SimulatedTransport {
    /// Build the fixtures described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulatedError::InvalidConfig`] for an empty mac or label,
    /// a zero zone count, or a mac listed twice.
    pub fn from_config(config: &SimulatedConfig) -> Result<Self, SimulatedError> {
        let mut fixtures = BTreeMap::new();
        for light in &config.lights {
            let (address, fixture) = Fixture::from_config(light)?;
            if fixtures.insert(address.clone(), fixture).is_some() {
                return Err(SimulatedError::InvalidConfig(format!(
                    "light {address} is listed twice"
                )));
            }
        }
        tracing::debug!(fixtures = fixtures.len(), "simulated medium ready");
        Ok(Self {
            fixtures,
            latency: Duration::from_millis(config.latency_ms),
            faults: FaultInjector::default(),
        })
    }

    /// Handle for injecting faults once the transport is owned by the hub.
    #[must_use]
    pub fn faults(&self) -> FaultInjector {
        self.faults.clone()
    }

    async fn round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn fixture(&self, address: &DeviceAddress) -> Result<&Fixture, SimulatedError> {
        if self.faults.is_unreachable(address) {
            return Err(SimulatedError::Unreachable(address.clone()));
        }
        self.fixtures
            .get(address)
            .ok_or_else(|| SimulatedError::UnknownLight(address.clone()))
    }

    fn fixture_mut(&mut self, address: &DeviceAddress) -> Result<&mut Fixture, SimulatedError> {
        if self.faults.is_unreachable(address) {
            return Err(SimulatedError::Unreachable(address.clone()));
        }
        self.fixtures
            .get_mut(address)
            .ok_or_else(|| SimulatedError::UnknownLight(address.clone()))
    }
}

impl Transport for SimulatedTransport {
    async fn discover(&mut self) -> Result<Vec<DiscoveredLight>, TransportError> {
        self.round_trip().await;
        Ok(self
            .fixtures
            .iter()
            .filter(|(address, _)| !self.faults.is_unreachable(address))
            .map(|(address, fixture)| DiscoveredLight {
                address: address.clone(),
                label: fixture.label.clone(),
                group_id: fixture.group_id.clone(),
                group_label: fixture.group_label.clone(),
                group_updated_at: None,
                zone_count: fixture.zone_count(),
            })
            .collect())
    }

    async fn read_power(&mut self, address: &DeviceAddress) -> Result<bool, TransportError> {
        self.round_trip().await;
        Ok(self.fixture(address)?.power)
    }

    async fn read_color(&mut self, address: &DeviceAddress) -> Result<Hsbk, TransportError> {
        self.round_trip().await;
        let fixture = self.fixture(address)?;
        Ok(fixture.colors.as_slice().first().copied().unwrap_or_default())
    }

    async fn read_zone_colors(
        &mut self,
        address: &DeviceAddress,
    ) -> Result<Vec<Hsbk>, TransportError> {
        self.round_trip().await;
        match &self.fixture(address)?.colors {
            ColorState::Zones(zones) => Ok(zones.clone()),
            ColorState::Single(_) => Err(SimulatedError::NoZones(address.clone()).into()),
        }
    }

    async fn read_uptime(&mut self, address: &DeviceAddress) -> Result<Duration, TransportError> {
        self.round_trip().await;
        Ok(self.fixture(address)?.booted_at.elapsed())
    }

    async fn write_power(&mut self, address: &DeviceAddress, on: bool) -> Result<(), TransportError> {
        self.round_trip().await;
        self.fixture_mut(address)?.power = on;
        tracing::trace!(address = %address, on, "simulated power write");
        Ok(())
    }

    async fn write_color(
        &mut self,
        address: &DeviceAddress,
        color: Hsbk,
        duration: TransitionTime,
    ) -> Result<(), TransportError> {
        self.round_trip().await;
        self.fixture_mut(address)?.colors.fill(color);
        tracing::trace!(address = %address, %duration, "simulated color write");
        Ok(())
    }

    async fn write_zone_color(
        &mut self,
        address: &DeviceAddress,
        zones: ZoneRange,
        color: Hsbk,
        duration: TransitionTime,
    ) -> Result<(), TransportError> {
        self.round_trip().await;
        self.fixture_mut(address)?
            .paint_zones(address, zones, color)?;
        tracing::trace!(address = %address, start = zones.start, end = zones.end, %duration, "simulated zone write");
        Ok(())
    }

    async fn write_zone_colors(
        &mut self,
        address: &DeviceAddress,
        colors: &[Hsbk],
        duration: TransitionTime,
    ) -> Result<(), TransportError> {
        self.round_trip().await;
        self.fixture_mut(address)?
            .replace_zones(address, colors)?;
        tracing::trace!(address = %address, zones = colors.len(), %duration, "simulated zone sequence write");
        Ok(())
    }
}

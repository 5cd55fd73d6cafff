//! In-memory port fakes shared by the unit tests of this crate.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use glowhub_domain::color::{ColorState, Hsbk};
use glowhub_domain::error::TransportError;
use glowhub_domain::event::HubEvent;
use glowhub_domain::id::{DeviceAddress, GroupId};
use glowhub_domain::transition::TransitionTime;
use glowhub_domain::zone::ZoneRange;

use crate::ports::{DiscoveredLight, EventPublisher, Transport};

#[derive(Debug, Clone)]
pub struct FakeLight {
    pub power: bool,
    pub colors: ColorState,
    pub uptime: Duration,
}

#[derive(Debug, Default)]
struct FakeState {
    lights: HashMap<DeviceAddress, FakeLight>,
    discovered: Vec<DiscoveredLight>,
    failing_reads: HashSet<DeviceAddress>,
    failing_writes: HashSet<DeviceAddress>,
    delay: Option<Duration>,
    ops: Vec<String>,
}

/// Transport fake. Clones share state, so a test keeps a handle after moving
/// one into the medium.
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn add_light(&self, address: &DeviceAddress, colors: ColorState) {
        self.lock().lights.insert(
            address.clone(),
            FakeLight {
                power: false,
                colors,
                uptime: Duration::from_secs(3600),
            },
        );
    }

    pub fn announce(&self, address: &str, group: &str, zone_count: Option<u16>) {
        let address = DeviceAddress::from_mac(address);
        let colors = match zone_count {
            Some(n) => ColorState::Zones(vec![Hsbk::default(); usize::from(n)]),
            None => ColorState::Single(Hsbk::default()),
        };
        self.add_light(&address, colors);
        let mut state = self.lock();
        state.discovered.retain(|found| found.address != address);
        state.discovered.push(DiscoveredLight {
            label: format!("Light {address}"),
            address,
            group_id: GroupId::new(group),
            group_label: group.to_string(),
            group_updated_at: None,
            zone_count,
        });
    }

    pub fn light(&self, address: &DeviceAddress) -> Option<FakeLight> {
        self.lock().lights.get(address).cloned()
    }

    pub fn set_colors(&self, address: &DeviceAddress, colors: ColorState) {
        if let Some(light) = self.lock().lights.get_mut(address) {
            light.colors = colors;
        }
    }

    pub fn fail_reads(&self, address: &DeviceAddress, fail: bool) {
        let mut state = self.lock();
        if fail {
            state.failing_reads.insert(address.clone());
        } else {
            state.failing_reads.remove(address);
        }
    }

    pub fn fail_writes(&self, address: &DeviceAddress, fail: bool) {
        let mut state = self.lock();
        if fail {
            state.failing_writes.insert(address.clone());
        } else {
            state.failing_writes.remove(address);
        }
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        self.lock().delay = delay;
    }

    /// Writes performed so far, oldest first.
    pub fn writes(&self) -> Vec<String> {
        self.lock()
            .ops
            .iter()
            .filter(|op| op.starts_with("write"))
            .cloned()
            .collect()
    }

    async fn pause(&self) {
        let delay = self.lock().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn read<R>(
        &self,
        address: &DeviceAddress,
        f: impl FnOnce(&FakeLight) -> R,
    ) -> Result<R, TransportError> {
        let mut state = self.lock();
        state.ops.push(format!("read {address}"));
        if state.failing_reads.contains(address) {
            return Err(TransportError::NoResponse(address.clone()));
        }
        state
            .lights
            .get(address)
            .map(f)
            .ok_or_else(|| TransportError::NoResponse(address.clone()))
    }

    fn write(
        &self,
        address: &DeviceAddress,
        op: String,
        f: impl FnOnce(&mut FakeLight),
    ) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.ops.push(op);
        if state.failing_writes.contains(address) {
            return Err(TransportError::NoResponse(address.clone()));
        }
        state
            .lights
            .get_mut(address)
            .map(f)
            .ok_or_else(|| TransportError::NoResponse(address.clone()))
    }
}

impl Transport for FakeTransport {
    async fn discover(&mut self) -> Result<Vec<DiscoveredLight>, TransportError> {
        self.pause().await;
        Ok(self.lock().discovered.clone())
    }

    async fn read_power(&mut self, address: &DeviceAddress) -> Result<bool, TransportError> {
        self.pause().await;
        self.read(address, |l| l.power)
    }

    async fn read_color(&mut self, address: &DeviceAddress) -> Result<Hsbk, TransportError> {
        self.pause().await;
        self.read(address, |l| l.colors.as_slice()[0])
    }

    async fn read_zone_colors(
        &mut self,
        address: &DeviceAddress,
    ) -> Result<Vec<Hsbk>, TransportError> {
        self.pause().await;
        self.read(address, |l| l.colors.as_slice().to_vec())
    }

    async fn read_uptime(&mut self, address: &DeviceAddress) -> Result<Duration, TransportError> {
        self.pause().await;
        self.read(address, |l| l.uptime)
    }

    async fn write_power(&mut self, address: &DeviceAddress, on: bool) -> Result<(), TransportError> {
        self.pause().await;
        self.write(address, format!("write_power {address} {on}"), |l| {
            l.power = on;
        })
    }

    async fn write_color(
        &mut self,
        address: &DeviceAddress,
        color: Hsbk,
        duration: TransitionTime,
    ) -> Result<(), TransportError> {
        self.pause().await;
        self.write(
            address,
            format!("write_color {address} {} {duration}", color.hue),
            |l| l.colors.fill(color),
        )
    }

    async fn write_zone_color(
        &mut self,
        address: &DeviceAddress,
        zones: ZoneRange,
        color: Hsbk,
        duration: TransitionTime,
    ) -> Result<(), TransportError> {
        self.pause().await;
        self.write(
            address,
            format!(
                "write_zone_color {address} {}..={} {} {duration}",
                zones.start, zones.end, color.hue
            ),
            |l| {
                if let ColorState::Zones(list) = &mut l.colors {
                    for (index, zone) in list.iter_mut().enumerate() {
                        if zones.contains(index) {
                            *zone = color;
                        }
                    }
                }
            },
        )
    }

    async fn write_zone_colors(
        &mut self,
        address: &DeviceAddress,
        colors: &[Hsbk],
        duration: TransitionTime,
    ) -> Result<(), TransportError> {
        self.pause().await;
        self.write(
            address,
            format!("write_zone_colors {address} {} {duration}", colors.len()),
            |l| l.colors = ColorState::Zones(colors.to_vec()),
        )
    }
}

/// Publisher fake keeping every event it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingPublisher {
    events: Arc<Mutex<Vec<HubEvent>>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<HubEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: HubEvent) -> impl Future<Output = ()> + Send {
        self.events.lock().unwrap().push(event);
        async {}
    }
}

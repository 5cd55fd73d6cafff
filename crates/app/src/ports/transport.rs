//! Transport port — the shared communication medium to the lights.
//!
//! The medium cannot be used concurrently. Implementations are therefore
//! owned by a [`SharedMedium`](crate::medium::SharedMedium) and only
//! reachable through the guard it hands out, which is why every method takes
//! `&mut self`.

use std::future::Future;
use std::time::Duration;

use glowhub_domain::color::Hsbk;
use glowhub_domain::error::TransportError;
use glowhub_domain::id::{DeviceAddress, GroupId};
use glowhub_domain::time::Timestamp;
use glowhub_domain::transition::TransitionTime;
use glowhub_domain::zone::ZoneRange;

/// A light answering a discovery broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLight {
    pub address: DeviceAddress,
    pub label: String,
    pub group_id: GroupId,
    pub group_label: String,
    pub group_updated_at: Option<Timestamp>,
    /// `Some(n)` for multi-zone fixtures.
    pub zone_count: Option<u16>,
}

/// Device get/set operations over the shared medium.
pub trait Transport: Send + 'static {
    /// Enumerate the lights currently reachable.
    fn discover(&mut self)
    -> impl Future<Output = Result<Vec<DiscoveredLight>, TransportError>> + Send;

    fn read_power(
        &mut self,
        address: &DeviceAddress,
    ) -> impl Future<Output = Result<bool, TransportError>> + Send;

    fn read_color(
        &mut self,
        address: &DeviceAddress,
    ) -> impl Future<Output = Result<Hsbk, TransportError>> + Send;

    fn read_zone_colors(
        &mut self,
        address: &DeviceAddress,
    ) -> impl Future<Output = Result<Vec<Hsbk>, TransportError>> + Send;

    fn read_uptime(
        &mut self,
        address: &DeviceAddress,
    ) -> impl Future<Output = Result<Duration, TransportError>> + Send;

    fn write_power(
        &mut self,
        address: &DeviceAddress,
        on: bool,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn write_color(
        &mut self,
        address: &DeviceAddress,
        color: Hsbk,
        duration: TransitionTime,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Paint every zone in `zones` with `color`.
    fn write_zone_color(
        &mut self,
        address: &DeviceAddress,
        zones: ZoneRange,
        color: Hsbk,
        duration: TransitionTime,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Write the full zone sequence at once.
    fn write_zone_colors(
        &mut self,
        address: &DeviceAddress,
        colors: &[Hsbk],
        duration: TransitionTime,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

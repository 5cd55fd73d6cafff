//! Shared-medium lock — exclusive access to the transport.
//!
//! The transport lives inside the lock, so the only way to talk to a light is
//! through a [`MediumGuard`]. The guard releases the medium when dropped,
//! whatever the outcome of the operation. Every guarded call is bounded by the
//! per-operation timeout so a silent light cannot stall the worker.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};

use glowhub_domain::color::Hsbk;
use glowhub_domain::error::TransportError;
use glowhub_domain::id::DeviceAddress;
use glowhub_domain::transition::TransitionTime;
use glowhub_domain::zone::ZoneRange;

use crate::ports::{DiscoveredLight, Transport};

/// Handle on the single, exclusive communication medium.
pub struct SharedMedium<T> {
    transport: Arc<Mutex<T>>,
    op_timeout: Duration,
}

impl<T> Clone for SharedMedium<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            op_timeout: self.op_timeout,
        }
    }
}

impl<T: Transport> SharedMedium<T> {
    /// Take ownership of the transport. `op_timeout` bounds every operation.
    pub fn new(transport: T, op_timeout: Duration) -> Self {
        Self {
            transport: Arc::new(Mutex::new(transport)),
            op_timeout,
        }
    }

    /// Wait for exclusive use of the medium.
    pub async fn acquire(&self) -> MediumGuard<'_, T> {
        MediumGuard {
            transport: self.transport.lock().await,
            op_timeout: self.op_timeout,
        }
    }
}

/// Exclusive access to the transport, released on drop.
pub struct MediumGuard<'a, T> {
    transport: MutexGuard<'a, T>,
    op_timeout: Duration,
}

async fn bounded<R>(
    limit: Duration,
    op: impl Future<Output = Result<R, TransportError>>,
) -> Result<R, TransportError> {
    tokio::time::timeout(limit, op)
        .await
        .unwrap_or_else(|_| Err(TransportError::Timeout(limit)))
}

impl<T: Transport> MediumGuard<'_, T> {
    pub async fn discover(&mut self) -> Result<Vec<DiscoveredLight>, TransportError> {
        let limit = self.op_timeout;
        bounded(limit, self.transport.discover()).await
    }

    pub async fn read_power(&mut self, address: &DeviceAddress) -> Result<bool, TransportError> {
        let limit = self.op_timeout;
        bounded(limit, self.transport.read_power(address)).await
    }

    pub async fn read_color(&mut self, address: &DeviceAddress) -> Result<Hsbk, TransportError> {
        let limit = self.op_timeout;
        bounded(limit, self.transport.read_color(address)).await
    }

    pub async fn read_zone_colors(
        &mut self,
        address: &DeviceAddress,
    ) -> Result<Vec<Hsbk>, TransportError> {
        let limit = self.op_timeout;
        bounded(limit, self.transport.read_zone_colors(address)).await
    }

    pub async fn read_uptime(
        &mut self,
        address: &DeviceAddress,
    ) -> Result<Duration, TransportError> {
        let limit = self.op_timeout;
        bounded(limit, self.transport.read_uptime(address)).await
    }

    pub async fn write_power(
        &mut self,
        address: &DeviceAddress,
        on: bool,
    ) -> Result<(), TransportError> {
        let limit = self.op_timeout;
        bounded(limit, self.transport.write_power(address, on)).await
    }

    pub async fn write_color(
        &mut self,
        address: &DeviceAddress,
        color: Hsbk,
        duration: TransitionTime,
    ) -> Result<(), TransportError> {
        let limit = self.op_timeout;
        bounded(limit, self.transport.write_color(address, color, duration)).await
    }

    pub async fn write_zone_color(
        &mut self,
        address: &DeviceAddress,
        zones: ZoneRange,
        color: Hsbk,
        duration: TransitionTime,
    ) -> Result<(), TransportError> {
        let limit = self.op_timeout;
        bounded(
            limit,
            self.transport
                .write_zone_color(address, zones, color, duration),
        )
        .await
    }

    pub async fn write_zone_colors(
        &mut self,
        address: &DeviceAddress,
        colors: &[Hsbk],
        duration: TransitionTime,
    ) -> Result<(), TransportError> {
        let limit = self.op_timeout;
        bounded(
            limit,
            self.transport.write_zone_colors(address, colors, duration),
        )
        .await
    }
}

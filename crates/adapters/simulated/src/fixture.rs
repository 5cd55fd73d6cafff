//! A simulated fixture — holds the state a real light would report.

use std::time::Instant;

use glowhub_domain::color::{ColorState, Hsbk};
use glowhub_domain::id::{DeviceAddress, GroupId, GroupKey};
use glowhub_domain::zone::ZoneRange;

use crate::config::SimulatedLightConfig;
use crate::error::SimulatedError;

/// Initial color of a freshly powered simulated fixture.
const BOOT_COLOR: Hsbk = Hsbk::new(0, 0, 65535, 3500);

#[derive(Debug, Clone)]
pub(crate) struct Fixture {
    pub(crate) label: String,
    pub(crate) group_id: GroupId,
    pub(crate) group_label: String,
    pub(crate) power: bool,
    pub(crate) colors: ColorState,
    pub(crate) booted_at: Instant,
}

impl Fixture {
    pub(crate) fn from_config(
        config: &SimulatedLightConfig,
    ) -> Result<(DeviceAddress, Self), SimulatedError> {
        let address = DeviceAddress::from_mac(&config.mac);
        if address.is_empty() {
            return Err(SimulatedError::InvalidConfig("light with empty mac".to_string()));
        }
        if config.label.trim().is_empty() {
            return Err(SimulatedError::InvalidConfig(format!(
                "light {address} has an empty label"
            )));
        }
        let colors = match config.zones {
            Some(0) => {
                return Err(SimulatedError::InvalidConfig(format!(
                    "light {address} declares zero zones"
                )));
            }
            Some(count) => ColorState::Zones(vec![BOOT_COLOR; usize::from(count)]),
            None => ColorState::Single(BOOT_COLOR),
        };
        let fixture = Self {
            label: config.label.clone(),
            group_id: GroupId::new(format!("group-{}", GroupKey::from_label(&config.group))),
            group_label: config.group.clone(),
            power: false,
            colors,
            booted_at: Instant::now(),
        };
        Ok((address, fixture))
    }

    pub(crate) fn zone_count(&self) -> Option<u16> {
        self.colors.is_zoned().then(|| self.colors.zone_count())
    }

    pub(crate) fn paint_zones(
        &mut self,
        address: &DeviceAddress,
        range: ZoneRange,
        color: Hsbk,
    ) -> Result<(), SimulatedError> {
        let ColorState::Zones(zones) = &mut self.colors else {
            return Err(SimulatedError::NoZones(address.clone()));
        };
        for (index, zone) in zones.iter_mut().enumerate() {
            if range.contains(index) {
                *zone = color;
            }
        }
        Ok(())
    }

    pub(crate) fn replace_zones(
        &mut self,
        address: &DeviceAddress,
        colors: &[Hsbk],
    ) -> Result<(), SimulatedError> {
        let ColorState::Zones(zones) = &mut self.colors else {
            return Err(SimulatedError::NoZones(address.clone()));
        };
        if zones.len() != colors.len() {
            return Err(SimulatedError::ZoneCountMismatch {
                expected: zones.len(),
                actual: colors.len(),
            });
        }
        zones.copy_from_slice(colors);
        Ok(())
    }
}

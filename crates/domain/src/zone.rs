//! Zone addressing for multi-zone lights.
//!
//! The hub selects zones with a 1-based number where `0` has two meanings:
//! on writes it targets every zone, on reads it addresses the *last* zone.
//! The aliasing is kept as-is because the hub's encoding has no spare value
//! for an "all zones" sentinel.

use serde::{Deserialize, Serialize};

/// Zone selected by the hub, always in `0..=zone_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneSelector(u16);

impl ZoneSelector {
    /// Selects every zone for writes (and the last zone for reads).
    pub const ALL: Self = Self(0);

    /// Build a selector, collapsing anything past `zone_count` to [`ALL`](Self::ALL).
    #[must_use]
    pub fn new(value: u16, zone_count: u16) -> Self {
        if value > zone_count {
            Self::ALL
        } else {
            Self(value)
        }
    }

    #[must_use]
    pub fn value(self) -> u16 {
        self.0
    }

    #[must_use]
    pub fn is_all(self) -> bool {
        self.0 == 0
    }

    /// Index into the zone color sequence used when reading back.
    ///
    /// `0` maps to `zone_count - 1`, `n` maps to `n - 1`.
    #[must_use]
    pub fn read_index(self, zone_count: u16) -> usize {
        if self.is_all() {
            usize::from(zone_count.saturating_sub(1))
        } else {
            usize::from(self.0 - 1)
        }
    }

    /// Zones a write through this selector lands on.
    #[must_use]
    pub fn write_range(self, zone_count: u16) -> ZoneRange {
        if self.is_all() {
            ZoneRange::all(zone_count)
        } else {
            ZoneRange::single(self.0 - 1)
        }
    }
}

/// Inclusive range of zone indices targeted by one write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneRange {
    pub start: u16,
    pub end: u16,
}

impl ZoneRange {
    #[must_use]
    pub fn all(zone_count: u16) -> Self {
        Self {
            start: 0,
            end: zone_count.saturating_sub(1),
        }
    }

    #[must_use]
    pub fn single(index: u16) -> Self {
        Self {
            start: index,
            end: index,
        }
    }

    #[must_use]
    pub fn contains(self, index: usize) -> bool {
        usize::from(self.start) <= index && index <= usize::from(self.end)
    }
}

//! Color values: HSBK tuples, per-light color state and the preset palette.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::zone::{ZoneRange, ZoneSelector};

/// One color as the lights understand it: hue, saturation and brightness on
/// the full `u16` range, plus a color temperature in kelvin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Hsbk {
    pub hue: u16,
    pub saturation: u16,
    pub brightness: u16,
    pub kelvin: u16,
}

/// A single component of an [`Hsbk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Hue,
    Saturation,
    Brightness,
    Kelvin,
}

impl Hsbk {
    #[must_use]
    pub const fn new(hue: u16, saturation: u16, brightness: u16, kelvin: u16) -> Self {
        Self {
            hue,
            saturation,
            brightness,
            kelvin,
        }
    }

    #[must_use]
    pub fn channel(self, channel: Channel) -> u16 {
        match channel {
            Channel::Hue => self.hue,
            Channel::Saturation => self.saturation,
            Channel::Brightness => self.brightness,
            Channel::Kelvin => self.kelvin,
        }
    }

    /// Copy of `self` with one channel replaced.
    #[must_use]
    pub fn with_channel(mut self, channel: Channel, value: u16) -> Self {
        match channel {
            Channel::Hue => self.hue = value,
            Channel::Saturation => self.saturation = value,
            Channel::Brightness => self.brightness = value,
            Channel::Kelvin => self.kelvin = value,
        }
        self
    }
}

/// Color state of a light: one color, or one color per zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "colors")]
pub enum ColorState {
    Single(Hsbk),
    Zones(Vec<Hsbk>),
}

impl ColorState {
    #[must_use]
    pub fn is_zoned(&self) -> bool {
        matches!(self, Self::Zones(_))
    }

    /// Number of addressable zones; a single-zone light counts as one.
    #[must_use]
    pub fn zone_count(&self) -> u16 {
        match self {
            Self::Single(_) => 1,
            Self::Zones(zones) => u16::try_from(zones.len()).unwrap_or(u16::MAX),
        }
    }

    /// The color exposed outward for the given selector.
    ///
    /// Multi-zone lights project a single zone, picked with
    /// [`ZoneSelector::read_index`].
    #[must_use]
    pub fn projected(&self, selector: ZoneSelector) -> Hsbk {
        match self {
            Self::Single(color) => *color,
            Self::Zones(zones) => zones
                .get(selector.read_index(self.zone_count()))
                .copied()
                .unwrap_or_default(),
        }
    }

    /// Paint every zone with `color`.
    pub fn fill(&mut self, color: Hsbk) {
        match self {
            Self::Single(current) => *current = color,
            Self::Zones(zones) => zones.iter_mut().for_each(|z| *z = color),
        }
    }

    /// Paint the zones in `range` with `color`. A single-zone light takes
    /// the color whatever the range.
    pub fn paint(&mut self, range: ZoneRange, color: Hsbk) {
        match self {
            Self::Single(current) => *current = color,
            Self::Zones(zones) => zones
                .iter_mut()
                .enumerate()
                .filter(|(index, _)| range.contains(*index))
                .for_each(|(_, zone)| *zone = color),
        }
    }

    /// All colors in zone order.
    #[must_use]
    pub fn as_slice(&self) -> &[Hsbk] {
        match self {
            Self::Single(color) => std::slice::from_ref(color),
            Self::Zones(zones) => zones,
        }
    }
}

/// Named colors the hub can pick by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorPreset {
    Red,
    Orange,
    Yellow,
    Green,
    Cyan,
    Blue,
    Purple,
    Pink,
    White,
    ColdWhite,
    WarmWhite,
    Gold,
}

impl ColorPreset {
    pub const ALL: [Self; 12] = [
        Self::Red,
        Self::Orange,
        Self::Yellow,
        Self::Green,
        Self::Cyan,
        Self::Blue,
        Self::Purple,
        Self::Pink,
        Self::White,
        Self::ColdWhite,
        Self::WarmWhite,
        Self::Gold,
    ];

    /// Look up a preset by its palette index.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownPreset`] when `index` is past the
    /// end of the palette.
    pub fn from_index(index: u8) -> Result<Self, ValidationError> {
        Self::ALL
            .get(usize::from(index))
            .copied()
            .ok_or(ValidationError::UnknownPreset(index))
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Red => "RED",
            Self::Orange => "ORANGE",
            Self::Yellow => "YELLOW",
            Self::Green => "GREEN",
            Self::Cyan => "CYAN",
            Self::Blue => "BLUE",
            Self::Purple => "PURPLE",
            Self::Pink => "PINK",
            Self::White => "WHITE",
            Self::ColdWhite => "COLD_WHITE",
            Self::WarmWhite => "WARM_WHITE",
            Self::Gold => "GOLD",
        }
    }

    #[must_use]
    pub fn hsbk(self) -> Hsbk {
        match self {
            Self::Red => Hsbk::new(62978, 65535, 65535, 3500),
            Self::Orange => Hsbk::new(5525, 65535, 65535, 3500),
            Self::Yellow => Hsbk::new(7615, 65535, 65535, 3500),
            Self::Green => Hsbk::new(16173, 65535, 65535, 3500),
            Self::Cyan => Hsbk::new(29814, 65535, 65535, 3500),
            Self::Blue => Hsbk::new(43634, 65535, 65535, 3500),
            Self::Purple => Hsbk::new(50486, 65535, 65535, 3500),
            Self::Pink => Hsbk::new(58275, 65535, 47142, 3500),
            Self::White => Hsbk::new(58275, 0, 65535, 5500),
            Self::ColdWhite => Hsbk::new(58275, 0, 65535, 9000),
            Self::WarmWhite => Hsbk::new(58275, 0, 65535, 3200),
            Self::Gold => Hsbk::new(58275, 0, 65535, 2500),
        }
    }
}

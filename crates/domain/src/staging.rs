//! Staged edits — bursts of single-field changes accumulated on a working copy
//! of a light's color state before being committed.
//!
//! A light is clean or holds exactly one [`StagedSnapshot`]. The first edit
//! of a burst clones the live mirror into the snapshot; later edits in the
//! same burst reuse it. Committing or discarding are the only ways back to
//! clean.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::{Channel, ColorState, Hsbk};
use crate::command::CommandKind;
use crate::error::ValidationError;
use crate::transition::TransitionTime;
use crate::zone::ZoneSelector;

/// A field the hub can edit one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Hue,
    Saturation,
    Brightness,
    Kelvin,
    Duration,
    Zone,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hue => "hue",
            Self::Saturation => "saturation",
            Self::Brightness => "brightness",
            Self::Kelvin => "kelvin",
            Self::Duration => "duration",
            Self::Zone => "zone",
        })
    }
}

/// A parsed single-field edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEdit {
    Channel(Channel, u16),
    Duration(TransitionTime),
    Zone(u16),
}

impl FieldEdit {
    /// Parse the raw value sent by the hub for `field`.
    ///
    /// Durations never fail: unparseable input becomes
    /// [`TransitionTime::ZERO`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedField`] when a color channel or
    /// zone value is not an unsigned 16-bit integer.
    pub fn parse(field: Field, raw: &str) -> Result<Self, ValidationError> {
        let number = || {
            raw.trim()
                .parse::<u16>()
                .map_err(|_| ValidationError::MalformedField {
                    field,
                    value: raw.to_string(),
                })
        };
        Ok(match field {
            Field::Hue => Self::Channel(Channel::Hue, number()?),
            Field::Saturation => Self::Channel(Channel::Saturation, number()?),
            Field::Brightness => Self::Channel(Channel::Brightness, number()?),
            Field::Kelvin => Self::Channel(Channel::Kelvin, number()?),
            Field::Duration => Self::Duration(TransitionTime::parse_lenient(raw)),
            Field::Zone => Self::Zone(number()?),
        })
    }
}

/// Working copy owned by a light while an edit burst is in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedSnapshot {
    colors: ColorState,
    duration: TransitionTime,
    zone: ZoneSelector,
}

impl StagedSnapshot {
    pub(crate) fn new(colors: ColorState, duration: TransitionTime, zone: ZoneSelector) -> Self {
        Self {
            colors,
            duration,
            zone,
        }
    }

    #[must_use]
    pub fn colors(&self) -> &ColorState {
        &self.colors
    }

    #[must_use]
    pub fn duration(&self) -> TransitionTime {
        self.duration
    }

    #[must_use]
    pub fn zone(&self) -> ZoneSelector {
        self.zone
    }

    pub(crate) fn into_parts(self) -> (ColorState, TransitionTime, ZoneSelector) {
        (self.colors, self.duration, self.zone)
    }

    /// Apply one field edit and return the write carrying the full color of
    /// the edited target.
    pub(crate) fn apply(&mut self, edit: FieldEdit) -> CommandKind {
        let count = self.colors.zone_count();
        match edit {
            FieldEdit::Duration(duration) => self.duration = duration,
            FieldEdit::Zone(value) => self.zone = ZoneSelector::new(value, count),
            FieldEdit::Channel(..) => {}
        }
        let mut color = self.colors.projected(self.zone);
        if let FieldEdit::Channel(channel, value) = edit {
            color = color.with_channel(channel, value);
        }
        self.paint(self.zone, color)
    }

    /// Stage a whole color for one zone (or all of them) without moving the
    /// selection.
    pub(crate) fn stage_zone_color(
        &mut self,
        zone: u16,
        color: Hsbk,
        duration: TransitionTime,
    ) -> CommandKind {
        self.duration = duration;
        let selector = ZoneSelector::new(zone, self.colors.zone_count());
        self.paint(selector, color)
    }

    fn paint(&mut self, selector: ZoneSelector, color: Hsbk) -> CommandKind {
        let duration = self.duration;
        if !self.colors.is_zoned() {
            self.colors.fill(color);
            return CommandKind::SetField { color, duration };
        }
        let range = selector.write_range(self.colors.zone_count());
        self.colors.paint(range, color);
        CommandKind::SetZoneField {
            zones: range,
            color,
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::ZoneRange;

    fn zoned(count: u16) -> StagedSnapshot {
        let zones = (0..count).map(|h| Hsbk::new(h, 0, 0, 3500)).collect();
        StagedSnapshot::new(
            ColorState::Zones(zones),
            TransitionTime::ZERO,
            ZoneSelector::ALL,
        )
    }

    #[test]
    fn should_parse_channel_edit() {
        assert_eq!(
            FieldEdit::parse(Field::Hue, "1200").unwrap(),
            FieldEdit::Channel(Channel::Hue, 1200)
        );
    }

    #[test]
    fn should_default_non_numeric_duration_to_zero() {
        assert_eq!(
            FieldEdit::parse(Field::Duration, "soon").unwrap(),
            FieldEdit::Duration(TransitionTime::ZERO)
        );
    }

    #[test]
    fn should_reject_non_numeric_channel_value() {
        let err = FieldEdit::parse(Field::Brightness, "bright").unwrap_err();
        assert_eq!(
            err,
            ValidationError::MalformedField {
                field: Field::Brightness,
                value: "bright".to_string()
            }
        );
    }

    #[test]
    fn should_write_full_color_for_single_zone_edit() {
        let mut snapshot = StagedSnapshot::new(
            ColorState::Single(Hsbk::new(10, 20, 30, 3500)),
            TransitionTime::from_millis(250),
            ZoneSelector::ALL,
        );
        let write = snapshot.apply(FieldEdit::Channel(Channel::Saturation, 99));
        assert_eq!(
            write,
            CommandKind::SetField {
                color: Hsbk::new(10, 99, 30, 3500),
                duration: TransitionTime::from_millis(250),
            }
        );
    }

    #[test]
    fn should_edit_only_the_selected_zone() {
        let mut snapshot = zoned(4);
        snapshot.apply(FieldEdit::Zone(2));
        let write = snapshot.apply(FieldEdit::Channel(Channel::Brightness, 500));
        assert_eq!(
            write,
            CommandKind::SetZoneField {
                zones: ZoneRange::single(1),
                color: Hsbk::new(1, 0, 500, 3500),
                duration: TransitionTime::ZERO,
            }
        );
        assert_eq!(snapshot.colors().as_slice()[0], Hsbk::new(0, 0, 0, 3500));
        assert_eq!(snapshot.colors().as_slice()[1], Hsbk::new(1, 0, 500, 3500));
    }

    #[test]
    fn should_paint_every_zone_when_all_selected() {
        let mut snapshot = zoned(4);
        let write = snapshot.apply(FieldEdit::Channel(Channel::Hue, 7));
        // Base color comes from the last zone through the read alias.
        let expected = Hsbk::new(7, 0, 0, 3500);
        assert_eq!(
            write,
            CommandKind::SetZoneField {
                zones: ZoneRange::all(4),
                color: expected,
                duration: TransitionTime::ZERO,
            }
        );
        assert!(snapshot.colors().as_slice().iter().all(|c| *c == expected));
    }

    #[test]
    fn should_stage_zone_color_without_moving_selection() {
        let mut snapshot = zoned(4);
        snapshot.apply(FieldEdit::Zone(1));
        let red = Hsbk::new(62978, 65535, 65535, 3500);
        snapshot.stage_zone_color(3, red, TransitionTime::from_millis(10));
        assert_eq!(snapshot.zone().value(), 1);
        assert_eq!(snapshot.colors().as_slice()[2], red);
        assert_eq!(snapshot.duration(), TransitionTime::from_millis(10));
    }
}

//! Light — per-device mirror of the last known state, connectivity, and
//! staged-edit bookkeeping.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::{ColorState, Hsbk};
use crate::command::CommandKind;
use crate::error::{GlowHubError, ValidationError};
use crate::id::{DeviceAddress, GroupId};
use crate::staging::{FieldEdit, StagedSnapshot};
use crate::time::{Timestamp, has_elapsed};
use crate::transition::TransitionTime;
use crate::zone::{ZoneRange, ZoneSelector};

/// Values read back from a light in one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReading {
    pub power: bool,
    pub colors: ColorState,
    pub uptime: Duration,
}

/// How a failed poll was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollFailure {
    /// Within the offline threshold; state left untouched.
    Transient { attempts: u32 },
    /// The light just crossed the offline threshold.
    WentOffline,
    /// The light was already marked offline.
    StillOffline,
}

/// A light fixture known to the hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightDevice {
    address: DeviceAddress,
    label: String,
    group: Option<GroupId>,
    power: bool,
    colors: ColorState,
    uptime: Duration,
    connected: bool,
    last_update: Option<Timestamp>,
    failed_polls: u32,
    /// `Some` while an edit burst is open; at most one per light.
    staged: Option<StagedSnapshot>,
    duration: TransitionTime,
    selected_zone: ZoneSelector,
}

impl LightDevice {
    /// Create a builder for constructing a [`LightDevice`].
    #[must_use]
    pub fn builder() -> LightDeviceBuilder {
        LightDeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::Validation`] when the address or label is
    /// empty, or a multi-zone light has no zones.
    pub fn validate(&self) -> Result<(), GlowHubError> {
        if self.address.is_empty() {
            return Err(ValidationError::EmptyAddress.into());
        }
        if self.label.is_empty() {
            return Err(ValidationError::EmptyLabel.into());
        }
        if matches!(&self.colors, ColorState::Zones(zones) if zones.is_empty()) {
            return Err(ValidationError::NoZones.into());
        }
        Ok(())
    }

    #[must_use]
    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn group(&self) -> Option<&GroupId> {
        self.group.as_ref()
    }

    /// Move the light to `group`. Returns whether the group changed.
    pub fn move_to_group(&mut self, group: GroupId) -> bool {
        if self.group.as_ref() == Some(&group) {
            return false;
        }
        self.group = Some(group);
        true
    }

    #[must_use]
    pub fn power(&self) -> bool {
        self.power
    }

    #[must_use]
    pub fn colors(&self) -> &ColorState {
        &self.colors
    }

    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.uptime
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    #[must_use]
    pub fn last_update(&self) -> Option<Timestamp> {
        self.last_update
    }

    #[must_use]
    pub fn failed_polls(&self) -> u32 {
        self.failed_polls
    }

    #[must_use]
    pub fn duration(&self) -> TransitionTime {
        self.duration
    }

    #[must_use]
    pub fn selected_zone(&self) -> ZoneSelector {
        self.selected_zone
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.staged.is_some()
    }

    #[must_use]
    pub fn staged(&self) -> Option<&StagedSnapshot> {
        self.staged.as_ref()
    }

    /// The single color exposed to the hub for this light.
    #[must_use]
    pub fn projected_color(&self) -> Hsbk {
        self.colors.projected(self.selected_zone)
    }

    // ── staged edits ──────────────────────────────────────────────

    /// Start an edit burst, or keep using the one in progress.
    pub fn begin_or_continue_edit(&mut self) -> &StagedSnapshot {
        self.staging_mut()
    }

    /// Apply one field edit to the staged snapshot.
    ///
    /// Returns the write to enqueue for the edited target.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::Disconnected`] when the light is offline, or
    /// [`ValidationError::ZonesUnsupported`] for a zone edit on a
    /// single-zone light. Nothing is staged in either case.
    pub fn edit_field(&mut self, edit: FieldEdit) -> Result<CommandKind, GlowHubError> {
        self.ensure_connected()?;
        if matches!(edit, FieldEdit::Zone(_)) && !self.colors.is_zoned() {
            return Err(ValidationError::ZonesUnsupported.into());
        }
        Ok(self.staging_mut().apply(edit))
    }

    /// Stage a whole color for one zone (`0` for every zone).
    ///
    /// # Errors
    ///
    /// Same as [`edit_field`](Self::edit_field); single-zone lights are
    /// rejected.
    pub fn stage_zone_color(
        &mut self,
        zone: u16,
        color: Hsbk,
        duration: TransitionTime,
    ) -> Result<CommandKind, GlowHubError> {
        self.ensure_connected()?;
        if !self.colors.is_zoned() {
            return Err(ValidationError::ZonesUnsupported.into());
        }
        Ok(self.staging_mut().stage_zone_color(zone, color, duration))
    }

    /// Promote the staged snapshot to the live mirror.
    ///
    /// Returns the final write, or `None` when nothing was staged.
    pub fn commit(&mut self) -> Option<CommandKind> {
        let snapshot = self.staged.take()?;
        let (colors, duration, zone) = snapshot.into_parts();
        self.colors = colors.clone();
        self.duration = duration;
        self.selected_zone = zone;
        Some(CommandKind::Commit { colors, duration })
    }

    /// Drop the staged snapshot without writing. Returns whether one existed.
    pub fn discard(&mut self) -> bool {
        self.staged.take().is_some()
    }

    // ── immediate writes ──────────────────────────────────────────

    /// Prepare a color change outside of a staged edit.
    ///
    /// On a multi-zone light the write covers the zones of the current
    /// selection: one zone, or all of them when the selector is `0`. The
    /// change supersedes any staged edit, which is discarded. The duration
    /// is remembered for later edits.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::Disconnected`] when the light is offline.
    pub fn prepare_color(
        &mut self,
        color: Hsbk,
        duration: TransitionTime,
    ) -> Result<CommandKind, GlowHubError> {
        self.ensure_connected()?;
        self.discard();
        self.duration = duration;
        let zones = self
            .colors
            .is_zoned()
            .then(|| self.selected_zone.write_range(self.colors.zone_count()));
        Ok(CommandKind::SetColor {
            color,
            duration,
            zones,
        })
    }

    /// Reflect a power write the light acknowledged.
    pub fn record_power_written(&mut self, on: bool) {
        self.power = on;
    }

    /// Reflect a color write the light acknowledged, on `zones` or on the
    /// whole light.
    ///
    /// Ignored while an edit is staged. Returns whether the mirror changed.
    pub fn record_color_written(&mut self, color: Hsbk, zones: Option<ZoneRange>) -> bool {
        if self.is_pending() {
            return false;
        }
        match zones {
            Some(range) => self.colors.paint(range, color),
            None => self.colors.fill(color),
        }
        true
    }

    // ── reconciliation ───────────────────────────────────────────

    /// Fold a successful poll into the mirror.
    ///
    /// Colors are left alone while an edit is staged; everything else
    /// refreshes. Returns whether the colors were overwritten.
    pub fn record_poll_success(&mut self, reading: PollReading, now: Timestamp) -> bool {
        self.power = reading.power;
        self.uptime = reading.uptime;
        self.connected = true;
        self.failed_polls = 0;
        self.last_update = Some(now);

        if self.is_pending() {
            return false;
        }
        let count = reading.colors.zone_count();
        self.selected_zone = ZoneSelector::new(self.selected_zone.value(), count);
        self.colors = reading.colors;
        true
    }

    /// Classify a failed poll, marking the light offline once `threshold`
    /// has passed without a successful read.
    pub fn record_poll_failure(&mut self, now: Timestamp, threshold: Duration) -> PollFailure {
        self.failed_polls = self.failed_polls.saturating_add(1);
        if !has_elapsed(self.last_update, now, threshold) {
            return PollFailure::Transient {
                attempts: self.failed_polls,
            };
        }
        self.uptime = Duration::ZERO;
        if std::mem::replace(&mut self.connected, false) {
            PollFailure::WentOffline
        } else {
            PollFailure::StillOffline
        }
    }

    /// Read-model snapshot handed to the protocol adapter.
    #[must_use]
    pub fn state(&self) -> LightState {
        LightState {
            address: self.address.clone(),
            label: self.label.clone(),
            group: self.group.clone(),
            power: self.power,
            colors: self.colors.clone(),
            projected: self.projected_color(),
            uptime_hours: uptime_hours(self.uptime),
            connected: self.connected,
            duration: self.duration,
            selected_zone: self.selected_zone,
            pending: self.is_pending(),
            last_update: self.last_update,
        }
    }

    fn ensure_connected(&self) -> Result<(), GlowHubError> {
        if self.connected {
            Ok(())
        } else {
            Err(GlowHubError::Disconnected(self.address.clone()))
        }
    }

    fn staging_mut(&mut self) -> &mut StagedSnapshot {
        let Self {
            staged,
            colors,
            duration,
            selected_zone,
            ..
        } = self;
        staged.get_or_insert_with(|| {
            StagedSnapshot::new(colors.clone(), *duration, *selected_zone)
        })
    }
}

/// Uptime in hours, rounded to two decimals.
fn uptime_hours(uptime: Duration) -> f64 {
    (uptime.as_secs_f64() / 36.0).round() / 100.0
}

/// Serializable view of a light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightState {
    pub address: DeviceAddress,
    pub label: String,
    pub group: Option<GroupId>,
    pub power: bool,
    pub colors: ColorState,
    pub projected: Hsbk,
    pub uptime_hours: f64,
    pub connected: bool,
    pub duration: TransitionTime,
    pub selected_zone: ZoneSelector,
    pub pending: bool,
    pub last_update: Option<Timestamp>,
}

/// Step-by-step builder for [`LightDevice`].
#[derive(Debug, Default)]
pub struct LightDeviceBuilder {
    address: Option<DeviceAddress>,
    label: Option<String>,
    group: Option<GroupId>,
    colors: Option<ColorState>,
    last_update: Option<Timestamp>,
}

impl LightDeviceBuilder {
    #[must_use]
    pub fn address(mut self, address: DeviceAddress) -> Self {
        self.address = Some(address);
        self
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    /// Make this a multi-zone light with `count` zones at the default color.
    #[must_use]
    pub fn zones(mut self, count: u16) -> Self {
        self.colors = Some(ColorState::Zones(vec![Hsbk::default(); usize::from(count)]));
        self
    }

    #[must_use]
    pub fn colors(mut self, colors: ColorState) -> Self {
        self.colors = Some(colors);
        self
    }

    #[must_use]
    pub fn last_update(mut self, at: Timestamp) -> Self {
        self.last_update = Some(at);
        self
    }

    /// Consume the builder, validate, and return a [`LightDevice`].
    ///
    /// New lights start connected, powered off and clean.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::Validation`] if the address or label is
    /// missing, or a multi-zone light has no zones.
    pub fn build(self) -> Result<LightDevice, GlowHubError> {
        let light = LightDevice {
            address: self.address.unwrap_or_else(|| DeviceAddress::from_mac("")),
            label: self.label.unwrap_or_default(),
            group: self.group,
            power: false,
            colors: self
                .colors
                .unwrap_or_else(|| ColorState::Single(Hsbk::default())),
            uptime: Duration::ZERO,
            connected: true,
            last_update: self.last_update,
            failed_polls: 0,
            staged: None,
            duration: TransitionTime::ZERO,
            selected_zone: ZoneSelector::ALL,
        };
        light.validate()?;
        Ok(light)
    }
}

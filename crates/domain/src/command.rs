//! Commands — deferred writes executed one at a time by the queue worker.

use serde::{Deserialize, Serialize};

use crate::color::{ColorState, Hsbk};
use crate::id::{CommandId, DeviceAddress, GroupKey};
use crate::time::{Timestamp, now};
use crate::transition::TransitionTime;
use crate::zone::ZoneRange;

/// A write bound to one light. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub id: CommandId,
    pub target: DeviceAddress,
    pub kind: CommandKind,
    pub submitted_at: Timestamp,
}

impl Command {
    #[must_use]
    pub fn new(target: DeviceAddress, kind: CommandKind) -> Self {
        Self {
            id: CommandId::new(),
            target,
            kind,
            submitted_at: now(),
        }
    }
}

/// What a [`Command`] does, with its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum CommandKind {
    PowerOn,
    PowerOff,
    /// Color change outside of a staged edit. `zones` is captured from the
    /// zone selection of a multi-zone light and is `None` for single bulbs.
    SetColor {
        color: Hsbk,
        duration: TransitionTime,
        zones: Option<ZoneRange>,
    },
    /// Single-zone staged edit: the full updated color.
    SetField {
        color: Hsbk,
        duration: TransitionTime,
    },
    /// Multi-zone staged edit: the full updated color for the edited zones.
    SetZoneField {
        zones: ZoneRange,
        color: Hsbk,
        duration: TransitionTime,
    },
    /// Final write of a committed staged edit.
    Commit {
        colors: ColorState,
        duration: TransitionTime,
    },
    /// One member's share of a group operation.
    GroupOp { group: GroupKey, op: GroupOperation },
}

impl CommandKind {
    /// Short name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PowerOn => "power_on",
            Self::PowerOff => "power_off",
            Self::SetColor { .. } => "set_color",
            Self::SetField { .. } => "set_field",
            Self::SetZoneField { .. } => "set_zone_field",
            Self::Commit { .. } => "commit",
            Self::GroupOp { .. } => "group_op",
        }
    }
}

/// Operation replicated across every member of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum GroupOperation {
    PowerOn,
    PowerOff,
    SetColor {
        color: Hsbk,
        duration: TransitionTime,
    },
}

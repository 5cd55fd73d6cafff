//! Transition time applied by the light when it changes color or power.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Transition duration in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionTime(u32);

impl TransitionTime {
    /// Apply changes immediately.
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn from_millis(millis: u32) -> Self {
        Self(millis)
    }

    #[must_use]
    pub fn as_millis(self) -> u32 {
        self.0
    }

    /// Parse a transition time sent by the hub.
    ///
    /// Anything that is not a non-negative integer yields [`ZERO`](Self::ZERO)
    /// instead of an error.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        raw.trim().parse().map_or(Self::ZERO, Self)
    }
}

impl fmt::Display for TransitionTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

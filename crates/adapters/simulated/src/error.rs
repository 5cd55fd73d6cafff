//! Simulated adapter error types.

use glowhub_domain::error::{GlowHubError, TransportError};
use glowhub_domain::id::DeviceAddress;

/// Errors specific to the simulated medium.
#[derive(Debug, thiserror::Error)]
pub enum SimulatedError {
    /// No fixture answers at this address.
    #[error("no simulated light at {0}")]
    UnknownLight(DeviceAddress),

    /// The fixture was made unreachable by fault injection.
    #[error("simulated light {0} is unreachable")]
    Unreachable(DeviceAddress),

    /// A zone operation reached a single-zone fixture.
    #[error("simulated light {0} has no zones")]
    NoZones(DeviceAddress),

    /// A full zone write carried the wrong number of colors.
    #[error("expected {expected} zone colors, got {actual}")]
    ZoneCountMismatch { expected: usize, actual: usize },

    /// The fixture list could not be turned into lights.
    #[error("invalid simulated light configuration: {0}")]
    InvalidConfig(String),
}

impl SimulatedError {
    /// Convert into a [`TransportError`] for propagation across the
    /// transport port.
    #[must_use]
    pub fn into_transport(self) -> TransportError {
        match self {
            Self::UnknownLight(address) | Self::Unreachable(address) => {
                TransportError::NoResponse(address)
            }
            other => TransportError::Protocol(other.to_string()),
        }
    }
}

impl From<SimulatedError> for TransportError {
    fn from(err: SimulatedError) -> Self {
        err.into_transport()
    }
}

impl From<SimulatedError> for GlowHubError {
    fn from(err: SimulatedError) -> Self {
        GlowHubError::Transport(err.into_transport())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> DeviceAddress {
        DeviceAddress::from_mac("d0:73:d5:00:00:09")
    }

    #[test]
    fn should_display_unreachable_error() {
        let err = SimulatedError::Unreachable(addr());
        assert_eq!(err.to_string(), "simulated light d073d5000009 is unreachable");
    }

    #[test]
    fn should_map_unreachable_to_no_response() {
        let err: TransportError = SimulatedError::Unreachable(addr()).into();
        assert_eq!(err, TransportError::NoResponse(addr()));
    }

    #[test]
    fn should_map_zone_mismatch_to_protocol_error() {
        let err: TransportError = SimulatedError::ZoneCountMismatch {
            expected: 8,
            actual: 3,
        }
        .into();
        assert_eq!(
            err,
            TransportError::Protocol("expected 8 zone colors, got 3".to_string())
        );
    }

    #[test]
    fn should_convert_into_root_error() {
        let err: GlowHubError = SimulatedError::NoZones(addr()).into();
        assert!(matches!(err, GlowHubError::Transport(TransportError::Protocol(_))));
    }
}

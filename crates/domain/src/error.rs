//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`GlowHubError`] via `#[from]`.

use std::time::Duration;

use crate::id::DeviceAddress;
use crate::staging::Field;

/// Root error type for glowhub operations.
#[derive(Debug, thiserror::Error)]
pub enum GlowHubError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("transport error")]
    Transport(#[from] TransportError),

    #[error("light {0} is disconnected")]
    Disconnected(DeviceAddress),

    #[error("command queue is closed")]
    QueueClosed,
}

/// Domain invariant violations and malformed input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("label must not be empty")]
    EmptyLabel,

    #[error("address must not be empty")]
    EmptyAddress,

    #[error("a multi-zone light needs at least one zone")]
    NoZones,

    #[error("invalid value {value:?} for field {field}")]
    MalformedField { field: Field, value: String },

    #[error("light does not support zones")]
    ZonesUnsupported,

    #[error("unknown color preset {0}")]
    UnknownPreset(u8),
}

/// A lookup by key found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Failure talking to a light over the shared medium.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("light {0} did not respond")]
    NoResponse(DeviceAddress),

    #[error("i/o failure: {0}")]
    Io(String),

    #[error("unexpected response: {0}")]
    Protocol(String),
}

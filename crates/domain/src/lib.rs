//! # glowhub-domain
//!
//! Pure domain model for the glowhub light adapter.
//!
//! ## Responsibilities
//! - Foundational types: addresses and keys, error conventions, timestamps
//! - Define **Lights** (mirror of last known state, connectivity, staged edits)
//! - Define **Zones** (addressing for multi-zone fixtures, including the
//!   `0 → last zone` read alias)
//! - Define **Staged edits** (`Clean → Staging → commit | discard`)
//! - Define **Groups** (label-derived keys; membership is always derived)
//! - Define **Commands** (tagged writes executed by the queue worker)
//! - Define **Events** (notifications for the protocol adapter)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod color;
pub mod command;
pub mod event;
pub mod group;
pub mod light;
pub mod staging;
pub mod transition;
pub mod zone;

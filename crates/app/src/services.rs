//! Application services — use-case implementations.
//!
//! Each service struct receives the shared registry, queue or medium handles
//! plus port implementations through its constructor, keeping this layer
//! decoupled from concrete adapters.

pub mod control_service;
pub mod discovery_service;
pub mod edit_service;
pub mod group_service;
pub mod reconcile_service;

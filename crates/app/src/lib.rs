//! # glowhub-app
//!
//! Application layer — use-cases, shared runtime machinery and **port
//! definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `Transport` — get/set operations over the shared medium
//!   - `EventPublisher` — state-change notifications
//! - Own the runtime pieces every use-case relies on:
//!   - `SharedMedium` — exclusive, time-bounded access to the transport
//!   - `CommandQueue` / `Worker` — FIFO writes executed one at a time
//!   - `LightRegistry` — the in-memory mirror of every light and group
//! - Provide the use-cases (`services`) and the `LightHub` facade that ties
//!   them together for protocol adapters
//! - Provide **in-process infrastructure** (event bus, poller) that doesn't
//!   need IO
//!
//! ## Dependency rule
//! Depends on `glowhub-domain` only (plus `tokio` for tasks, channels and
//! timers). Never imports adapter crates. Adapters depend on *this* crate,
//! not the reverse.

pub mod event_bus;
pub mod hub;
pub mod medium;
pub mod poller;
pub mod ports;
pub mod queue;
pub mod registry;
pub mod services;

#[cfg(test)]
mod testing;

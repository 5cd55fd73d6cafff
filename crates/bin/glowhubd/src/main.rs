//! # glowhubd — glowhub daemon
//!
//! Composition root that wires the transport, the hub core and the event log
//! together and runs until interrupted.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Initialise structured logging
//! - Construct the transport adapter and the in-process event bus
//! - Start the hub (queue worker), run discovery and start the poller
//! - Log every hub event as JSON
//! - Handle graceful shutdown (Ctrl-C): stop polling, drain the queue
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use anyhow::Context;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use glowhub_adapter_simulated::SimulatedTransport;
use glowhub_app::event_bus::InProcessEventBus;
use glowhub_app::hub::LightHub;
use glowhub_domain::event::HubEvent;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    let filter = EnvFilter::try_new(&config.logging.filter)
        .with_context(|| format!("invalid log filter {:?}", config.logging.filter))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Transport
    let transport = SimulatedTransport::from_config(&config.simulated)
        .context("failed to build simulated light network")?;

    // Event bus
    let event_bus = InProcessEventBus::new(256);
    let event_log = tokio::spawn(log_events(event_bus.subscribe()));

    // Hub
    let hub = LightHub::start(transport, event_bus, config.hub_options());
    let report = hub.discover().await.context("initial discovery failed")?;
    tracing::info!(
        lights = report.lights_added,
        groups = report.groups_added,
        "glowhubd started"
    );
    let poller = hub.spawn_poller(config.poll_interval());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("shutdown requested");

    poller.abort();
    hub.shutdown().await.context("failed to drain command queue")?;
    event_log.abort();
    Ok(())
}

/// Write every hub event to the log as one JSON line.
async fn log_events(mut events: broadcast::Receiver<HubEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => tracing::info!(target: "glowhubd::events", %json, "hub event"),
                Err(err) => tracing::warn!(%err, "failed to serialise hub event"),
            },
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event log fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

//! # airhubd — airhub daemon
//!
//! Composition root that wires the purifier integration into the hub.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars) and initialise logging
//! - Build the purifier integration and set up every configured device
//! - Register the integration's services
//! - Run the update coordinator and log fresh entity snapshots
//! - Accept service calls as JSON lines on stdin, e.g.
//!   `{"domain": "fan", "service": "set_mode", "data": {"mode": 2}}`
//! - Handle graceful shutdown (SIGINT)
//!
//! No network transport is linked in yet, so every configured purifier is
//! backed by a [`SimulatedPurifier`].
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use airhub_adapter_miot_purifier::{AirPurifierIntegration, SimulatedPurifier};
use airhub_app::coordinator::UpdateCoordinator;
use airhub_app::ports::Integration;
use airhub_app::services::service_registry::ServiceRegistry;
use airhub_domain::service::ServiceCall;

use config::Config;

type Purifiers = AirPurifierIntegration<SimulatedPurifier>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    if config.purifiers.is_empty() {
        tracing::warn!("no purifiers configured");
    }

    // Integration
    let mut integration = config
        .purifiers
        .iter()
        .cloned()
        .fold(Purifiers::new(), |acc, purifier| {
            acc.with_device(purifier, SimulatedPurifier::new())
        });
    let discovered = integration.setup().await?;
    tracing::info!(
        integration = integration.name(),
        devices = discovered.len(),
        "integration ready"
    );

    let integration = Arc::new(integration);
    let registry = ServiceRegistry::register(Arc::clone(&integration));

    // Polling
    let (tx, mut rx) = mpsc::channel(64);
    let coordinator = UpdateCoordinator::start(Arc::clone(&integration), config.scan_interval(), tx);
    let listener = tokio::spawn(async move {
        while let Some(entity) = rx.recv().await {
            tracing::debug!(
                entity_id = %entity.entity_id,
                state = %entity.state,
                "entity updated"
            );
        }
    });

    // Service calls
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            res = &mut shutdown => {
                res?;
                tracing::info!("shutdown requested");
                break;
            }
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => dispatch(&registry, &line).await,
                None => stdin_open = false,
            },
        }
    }

    // Teardown
    coordinator.abort();
    let _ = coordinator.await;
    let _ = listener.await;
    drop(registry);

    match Arc::into_inner(integration) {
        Some(mut integration) => integration.teardown().await?,
        None => tracing::warn!("integration still shared, skipping teardown"),
    }

    Ok(())
}

async fn dispatch(registry: &ServiceRegistry<Purifiers>, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    let call: ServiceCall = match serde_json::from_str(line) {
        Ok(call) => call,
        Err(err) => {
            tracing::warn!(%err, "malformed service call");
            return;
        }
    };

    match registry.call(&call).await {
        Ok(outcomes) => {
            let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
            tracing::info!(
                domain = %call.domain,
                service = %call.service,
                succeeded,
                failed = outcomes.len() - succeeded,
                "service call handled"
            );
        }
        Err(err) => {
            tracing::warn!(domain = %call.domain, service = %call.service, %err, "service call rejected");
        }
    }
}

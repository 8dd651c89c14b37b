//! fanout binding controller
//!
//! Runs the binding controller against an in-memory store seeded from a
//! JSON file.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use fanout_binding_controller::{
    config,
    controller::{BindingController, BindingEvent, BindingReconciler},
    seed::Seed,
    store::MemoryStore,
};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const EVENT_QUEUE_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::Config::from_env()?;

    // Initialize tracing (prefer RUST_LOG, fallback to FANOUT_LOG_LEVEL)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting fanout binding controller");
    info!(
        resync_interval_secs = config.resync_interval.as_secs(),
        replica_kinds = ?config.replica_kinds,
        "Configuration loaded"
    );

    let seed = match &config.seed_file {
        Some(path) => match Seed::from_file(path) {
            Ok(seed) => seed,
            Err(e) => {
                error!(error = %e, "Failed to load seed file");
                return Err(e);
            }
        },
        None => {
            warn!("No seed file configured, starting with an empty store");
            Seed::default()
        }
    };

    let store = Arc::new(MemoryStore::new());
    let keys = seed.load(&store).await;

    let reconciler = BindingReconciler::new(
        store.clone(),
        Arc::new(seed.override_manager()),
        config.materialize_options(),
    );
    let controller = BindingController::new(reconciler, config.controller());

    // Create shutdown channel for graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);

    let controller_handle = tokio::spawn(controller.run(event_rx, event_tx.clone(), shutdown_rx));

    for key in keys {
        if event_tx.send(BindingEvent::Retry(key)).await.is_err() {
            error!("Binding controller stopped before startup sync");
            break;
        }
    }

    // Wait for shutdown signal (Ctrl+C)
    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal");

    let _ = shutdown_tx.send(true);

    info!("Waiting for binding controller to shut down...");
    let shutdown_timeout = Duration::from_secs(10);
    if let Err(e) = tokio::time::timeout(shutdown_timeout, controller_handle).await {
        warn!(error = %e, "Binding controller did not shut down in time");
    }

    info!(works = store.works().await.len(), "Binding controller shutdown complete");
    Ok(())
}

//! Chanflow history worker
//!
//! Usage:
//!     chanflow-worker --broker sqlite:chanflow_broker.sqlite --fixtures fixtures.json

use anyhow::Context;
use chanflow_logging::{init_logging, LogConfig};
use chanflow_worker::{FixtureConnector, Worker, WorkerArgs};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = WorkerArgs::parse();
    let config = args.worker_config();

    let _log_guard = init_logging(LogConfig {
        app_name: &config.worker_id,
        verbose: args.verbose,
        log_dir: None,
    })?;

    let connector = FixtureConnector::from_path(&args.fixtures)
        .with_context(|| format!("Failed to load fixtures: {}", args.fixtures.display()))?;
    let broker = chanflow_broker::connect(&args.broker)
        .await
        .with_context(|| format!("Failed to open broker: {}", args.broker))?;

    info!("Starting Chanflow worker");
    info!("  Broker: {}", args.broker);
    info!("  Worker ID: {}", config.worker_id);
    info!("  Batch size: {}", config.batch_size);

    let worker = Worker::new(config, broker, Arc::new(connector));

    tokio::select! {
        _ = worker.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for interrupt")?;
            info!("Interrupt received, worker stopped");
        }
    }

    Ok(())
}

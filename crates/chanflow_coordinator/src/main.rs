//! Chanflow coordinator
//!
//! Usage:
//!     chanflow-coordinator --database sqlite:chanflow.sqlite --broker sqlite:chanflow_broker.sqlite

use anyhow::Context;
use chanflow_coordinator::{Coordinator, CoordinatorArgs, IngestorConfig};
use chanflow_db::ChanflowDb;
use chanflow_logging::{init_logging, LogConfig};
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CoordinatorArgs::parse();

    let _log_guard = init_logging(LogConfig {
        app_name: "chanflow-coordinator",
        verbose: args.verbose,
        log_dir: None,
    })?;

    info!("Starting Chanflow coordinator");
    info!("  Database: {}", args.database);
    info!("  Broker: {}", args.broker);

    let db = ChanflowDb::connect(&args.database)
        .await
        .with_context(|| format!("Failed to open database: {}", args.database))?;
    let broker = chanflow_broker::connect(&args.broker)
        .await
        .with_context(|| format!("Failed to open broker: {}", args.broker))?;

    let coordinator = Coordinator::new(
        db,
        broker,
        args.dispatcher_config(),
        IngestorConfig::default(),
    );
    coordinator.run_until(shutdown_signal()).await?;

    info!("Coordinator stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for interrupt: {}", e);
        std::future::pending::<()>().await;
    }
}

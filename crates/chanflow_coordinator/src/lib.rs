//! Chanflow coordinator
//!
//! One process hosting the two store-facing components:
//!
//! - [`Dispatcher`]: claims a pending channel for an active account and
//!   pushes a history task onto `tasks_queue`.
//! - [`Ingestor`]: drains `results_queue` into the message table and marks
//!   channels done.
//!
//! Workers run elsewhere and only share the broker with this process.

pub mod dispatcher;
pub mod error;
pub mod ingestor;
pub mod service;

pub use dispatcher::{Dispatcher, DispatcherConfig, TickOutcome};
pub use error::{CoordinatorError, Result};
pub use ingestor::{IngestOutcome, Ingestor, IngestorConfig};
pub use service::Coordinator;

use chanflow_protocol::defaults::{DEFAULT_BROKER_URL, DEFAULT_DATABASE_URL, DISPATCH_INTERVAL_SECS};
use std::time::Duration;

#[derive(clap::Parser, Debug)]
#[command(name = "chanflow-coordinator", about = "Dispatcher and ingestor for Chanflow")]
pub struct CoordinatorArgs {
    /// Database connection string
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database: String,

    /// Broker URL (`sqlite:<path>` or `memory:`)
    #[arg(long, env = "BROKER_URL", default_value = DEFAULT_BROKER_URL)]
    pub broker: String,

    /// Seconds between dispatcher ticks
    #[arg(long, default_value_t = DISPATCH_INTERVAL_SECS)]
    pub dispatch_interval_secs: u64,

    /// Debug-level console logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl CoordinatorArgs {
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            interval: Duration::from_secs(self.dispatch_interval_secs.max(1)),
        }
    }
}

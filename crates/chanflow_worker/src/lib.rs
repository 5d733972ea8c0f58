//! Chanflow history worker
//!
//! A worker process pulls history tasks from the broker, fetches messages
//! through a [`MessagingConnector`] and pushes results back for the
//! coordinator to ingest. Any number of workers may share one broker.

pub mod fixture;
pub mod messaging;
pub mod worker;

pub use fixture::{FixtureConnector, FixtureData};
pub use messaging::{
    FetchedMessage, MessageStream, MessagingClient, MessagingConnector, MessagingError,
    SessionCredentials,
};
pub use worker::{generate_worker_id, TaskOutcome, Worker, WorkerConfig, WorkerError};

use chanflow_protocol::defaults::{DEFAULT_BROKER_URL, HISTORY_BATCH_SIZE, WORKER_POP_TIMEOUT_SECS};
use std::path::PathBuf;
use std::time::Duration;

#[derive(clap::Parser, Debug)]
#[command(name = "chanflow-worker", about = "History worker for the Chanflow pipeline")]
pub struct WorkerArgs {
    /// Broker URL (`sqlite:<path>` or `memory:`)
    #[arg(long, env = "BROKER_URL", default_value = DEFAULT_BROKER_URL)]
    pub broker: String,

    /// Worker ID (auto-generated if not provided)
    #[arg(long, env = "HOSTNAME")]
    pub worker_id: Option<String>,

    /// Seconds to block on the task queue before polling again
    #[arg(long, default_value_t = WORKER_POP_TIMEOUT_SECS)]
    pub pop_timeout_secs: u64,

    /// Maximum messages fetched per task
    #[arg(long, default_value_t = HISTORY_BATCH_SIZE)]
    pub batch_size: usize,

    /// JSON fixture replayed by the messaging capability
    #[arg(long, env = "CHANFLOW_FIXTURES")]
    pub fixtures: PathBuf,

    /// Debug-level console logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl WorkerArgs {
    pub fn worker_config(&self) -> WorkerConfig {
        let worker_id = self
            .worker_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(generate_worker_id);

        WorkerConfig {
            worker_id,
            pop_timeout: Duration::from_secs(self.pop_timeout_secs),
            batch_size: self.batch_size.max(1),
        }
    }
}

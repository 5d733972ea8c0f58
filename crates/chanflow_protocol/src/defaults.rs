//! Canonical default values shared by the coordinator and workers.

/// Queue carrying [`crate::Task`] payloads from the dispatcher to workers.
pub const TASKS_QUEUE: &str = "tasks_queue";
/// Queue carrying [`crate::ScrapeResult`] payloads from workers to the ingestor.
pub const RESULTS_QUEUE: &str = "results_queue";

pub const DEFAULT_DATABASE_URL: &str = "sqlite:chanflow.sqlite";
pub const DEFAULT_BROKER_URL: &str = "sqlite:chanflow_broker.sqlite";

/// Seconds between dispatcher ticks.
pub const DISPATCH_INTERVAL_SECS: u64 = 5;
/// Worker blocking-pop timeout on the task queue.
pub const WORKER_POP_TIMEOUT_SECS: u64 = 5;
/// Ingestor blocking-pop timeout on the results queue.
pub const INGEST_POP_TIMEOUT_SECS: u64 = 1;
/// Pause after a failed ingest before the next pop.
pub const INGEST_ERROR_PAUSE_SECS: u64 = 1;
/// Maximum number of messages fetched per history task.
pub const HISTORY_BATCH_SIZE: usize = 50;

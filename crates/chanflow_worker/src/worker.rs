//! History worker
//!
//! Pops [`Task`]s from `tasks_queue`, drives the messaging capability and
//! streams [`ScrapeResult`]s onto `results_queue`:
//!
//! 1. Build a client from the task credentials and connect.
//! 2. Abandon the task if the session is not authorized.
//! 3. Push one `MessageRecord` per fetched message as soon as it arrives.
//! 4. Push a `CompletionMarker` carrying the highest id seen (or `min_id`).
//!
//! The client is disconnected on every exit path. Errors abort the task
//! without a completion marker, which leaves the channel in PARSING.

use chanflow_broker::{BrokerError, QueueBroker};
use chanflow_protocol::defaults::{
    HISTORY_BATCH_SIZE, RESULTS_QUEUE, TASKS_QUEUE, WORKER_POP_TIMEOUT_SECS,
};
use chanflow_protocol::{
    CompletionMarker, HistoryTask, MessageRecord, ProtocolError, ProxyConfig, ScrapeResult, Task,
};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::messaging::{MessagingClient, MessagingConnector, MessagingError, SessionCredentials};

/// Pause after a broker failure before polling again.
const BROKER_ERROR_PAUSE: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Messaging failed: {0}")]
    Messaging(#[from] MessagingError),

    #[error("Broker failed: {0}")]
    Broker(#[from] BrokerError),
}

/// How a task ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// History streamed and completion marker pushed
    Completed { fetched: usize, max_id: i64 },
    /// Session rejected; nothing was pushed
    Unauthorized,
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub worker_id: String,
    pub pop_timeout: Duration,
    pub batch_size: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: generate_worker_id(),
            pop_timeout: Duration::from_secs(WORKER_POP_TIMEOUT_SECS),
            batch_size: HISTORY_BATCH_SIZE,
        }
    }
}

/// `worker-<first 8 hex chars of a v4 uuid>`
pub fn generate_worker_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("worker-{}", &id[..8])
}

pub struct Worker {
    config: WorkerConfig,
    broker: Arc<dyn QueueBroker>,
    connector: Arc<dyn MessagingConnector>,
}

impl Worker {
    pub fn new(
        config: WorkerConfig,
        broker: Arc<dyn QueueBroker>,
        connector: Arc<dyn MessagingConnector>,
    ) -> Self {
        Self {
            config,
            broker,
            connector,
        }
    }

    pub fn worker_id(&self) -> &str {
        &self.config.worker_id
    }

    /// Poll forever. Never returns; the binary stops it on interrupt.
    pub async fn run(&self) {
        info!(worker_id = %self.config.worker_id, "Worker waiting for tasks");
        loop {
            match self.poll_once().await {
                Err(WorkerError::Broker(e)) => {
                    error!(worker_id = %self.config.worker_id, "Broker error: {}", e);
                    tokio::time::sleep(BROKER_ERROR_PAUSE).await;
                }
                // Task failures are already logged inside the task span
                Ok(_) | Err(_) => {}
            }
        }
    }

    /// Pop and process at most one task. `Ok(None)` means the pop timed out.
    pub async fn poll_once(&self) -> Result<Option<TaskOutcome>, WorkerError> {
        let Some(payload) = self.broker.pop(TASKS_QUEUE, self.config.pop_timeout).await? else {
            return Ok(None);
        };
        let task = Task::decode(&payload).map_err(|e| {
            warn!(worker_id = %self.config.worker_id, "Dropping malformed task: {}", e);
            e
        })?;
        self.process_task(&task).await.map(Some)
    }

    pub async fn process_task(&self, task: &Task) -> Result<TaskOutcome, WorkerError> {
        let Task::History(task) = task;
        let span = info_span!(
            "worker.process_task",
            worker_id = %self.config.worker_id,
            channel = %task.channel,
            min_id = task.min_id,
        );
        self.process_history(task).instrument(span).await
    }

    async fn process_history(&self, task: &HistoryTask) -> Result<TaskOutcome, WorkerError> {
        let proxy = ProxyConfig::parse_optional(task.proxy.as_deref()).map_err(|e| {
            error!("Abandoning task: {}", e);
            e
        })?;
        let credentials = SessionCredentials {
            session: task.session.clone(),
            api_id: task.api_id,
            api_hash: task.api_hash.clone(),
            proxy,
        };

        let mut client = self.connector.build(&credentials).await?;
        let outcome = self.fetch_history(client.as_mut(), task).await;
        if let Err(e) = client.disconnect().await {
            warn!("Disconnect failed: {}", e);
        }

        if let Err(e) = &outcome {
            error!("History task failed: {}", e);
        }
        outcome
    }

    async fn fetch_history(
        &self,
        client: &mut dyn MessagingClient,
        task: &HistoryTask,
    ) -> Result<TaskOutcome, WorkerError> {
        client.connect().await?;
        if !client.is_authorized().await? {
            warn!("Session not authorized, abandoning task");
            return Ok(TaskOutcome::Unauthorized);
        }

        let mut fetched = 0usize;
        let mut max_id = task.min_id;
        {
            let batch = self.config.batch_size;
            let mut messages = client.iter_messages(&task.channel, task.min_id, batch).take(batch);
            while let Some(message) = messages.next().await {
                let message = message?;
                max_id = max_id.max(message.id);
                let record = ScrapeResult::Message(MessageRecord {
                    channel: task.channel.clone(),
                    external_id: message.id,
                    text: message.text,
                    timestamp: message.date,
                });
                self.broker.push(RESULTS_QUEUE, record.encode()?).await?;
                fetched += 1;
                debug!(external_id = message.id, "Message pushed");
            }
        }

        let marker = ScrapeResult::Completion(CompletionMarker {
            channel: task.channel.clone(),
            max_id,
        });
        self.broker.push(RESULTS_QUEUE, marker.encode()?).await?;
        info!(fetched, max_id, "History task completed");

        Ok(TaskOutcome::Completed { fetched, max_id })
    }
}

//! Ingestor: persists worker results.
//!
//! Each result is applied on its own; there is no batching and no
//! cross-result transaction. A result that cannot be decoded or stored is
//! logged and dropped. A failed pop is logged as a broker failure.

use chanflow_broker::QueueBroker;
use chanflow_db::{ChanflowDb, NewMessage};
use chanflow_protocol::defaults::{INGEST_ERROR_PAUSE_SECS, INGEST_POP_TIMEOUT_SECS, RESULTS_QUEUE};
use chanflow_protocol::ScrapeResult;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::{CoordinatorError, Result};

#[derive(Debug, Clone)]
pub struct IngestorConfig {
    pub pop_timeout: Duration,
    /// Sleep after a failed result before popping again
    pub error_pause: Duration,
}

impl Default for IngestorConfig {
    fn default() -> Self {
        Self {
            pop_timeout: Duration::from_secs(INGEST_POP_TIMEOUT_SECS),
            error_pause: Duration::from_secs(INGEST_ERROR_PAUSE_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    MessageStored { channel: String, external_id: i64 },
    ChannelCompleted { channel: String, max_id: i64 },
    /// Completion marker for a handle that is not in the store
    UnknownChannel { channel: String },
}

pub struct Ingestor {
    db: ChanflowDb,
    broker: Arc<dyn QueueBroker>,
    config: IngestorConfig,
}

impl Ingestor {
    pub fn new(db: ChanflowDb, broker: Arc<dyn QueueBroker>, config: IngestorConfig) -> Self {
        Self { db, broker, config }
    }

    pub async fn run(&self) {
        info!("Ingestor started");
        loop {
            match self.ingest_next().await {
                Ok(_) => {}
                // Nothing was popped, so nothing was dropped
                Err(CoordinatorError::Broker(e)) => {
                    error!("Results pop failed: {}", e);
                    tokio::time::sleep(self.config.error_pause).await;
                }
                Err(e) => {
                    error!("Dropping result: {}", e);
                    tokio::time::sleep(self.config.error_pause).await;
                }
            }
        }
    }

    /// Pop and apply one result. `Ok(None)` means the pop timed out.
    pub async fn ingest_next(&self) -> Result<Option<IngestOutcome>> {
        let Some(payload) = self.broker.pop(RESULTS_QUEUE, self.config.pop_timeout).await? else {
            return Ok(None);
        };
        let result = ScrapeResult::decode(&payload)?;
        self.apply(result).await.map(Some)
    }

    pub async fn apply(&self, result: ScrapeResult) -> Result<IngestOutcome> {
        match result {
            ScrapeResult::Message(record) => {
                let channel = record.channel.clone();
                let external_id = record.external_id;
                self.db.insert_message(&NewMessage::from(record)).await?;
                debug!(channel = %channel, external_id, "Message stored");
                Ok(IngestOutcome::MessageStored {
                    channel,
                    external_id,
                })
            }
            ScrapeResult::Completion(marker) => {
                if self.db.complete_channel(&marker.channel, marker.max_id).await? {
                    info!(channel = %marker.channel, max_id = marker.max_id, "Channel parsed");
                    Ok(IngestOutcome::ChannelCompleted {
                        channel: marker.channel,
                        max_id: marker.max_id,
                    })
                } else {
                    warn!(channel = %marker.channel, "Completion for unknown channel ignored");
                    Ok(IngestOutcome::UnknownChannel {
                        channel: marker.channel,
                    })
                }
            }
        }
    }
}

//! Queue broker for the Chanflow pipeline
//!
//! Two named FIFO queues connect the components: `tasks_queue`
//! (dispatcher -> workers) and `results_queue` (workers -> ingestor).
//!
//! Delivery is at-most-once: `pop` removes the item before the consumer
//! processes it and there is no acknowledgment. A consumer that dies after
//! popping loses that item.

mod error;
mod memory;
mod sqlite;

pub use error::{BrokerError, Result};
pub use memory::MemoryBroker;
pub use sqlite::SqliteBroker;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Push/pop contract shared by every broker backend.
#[async_trait]
pub trait QueueBroker: Send + Sync {
    /// Append a payload to the tail of `queue`. Never blocks on consumers.
    async fn push(&self, queue: &str, payload: Vec<u8>) -> Result<()>;

    /// Remove and return the head of `queue`, waiting up to `timeout` for
    /// one to arrive. `Ok(None)` means the wait timed out.
    async fn pop(&self, queue: &str, timeout: Duration) -> Result<Option<Vec<u8>>>;

    /// Number of payloads currently waiting in `queue`.
    async fn depth(&self, queue: &str) -> Result<usize>;
}

/// Parsed broker URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerUrl {
    /// `memory:` - process-local queues
    Memory,
    /// `sqlite:<path>` - durable queues shared between processes
    Sqlite(PathBuf),
}

impl BrokerUrl {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw == "memory:" || raw == "memory" {
            return Ok(Self::Memory);
        }
        if let Some(rest) = raw
            .strip_prefix("sqlite://")
            .or_else(|| raw.strip_prefix("sqlite:"))
        {
            let path = rest.trim();
            if path.is_empty() {
                return Err(BrokerError::InvalidUrl(format!("sqlite URL missing path: {raw}")));
            }
            return Ok(Self::Sqlite(PathBuf::from(path)));
        }
        Err(BrokerError::InvalidUrl(format!("unsupported broker URL: {raw}")))
    }
}

/// Open the broker named by `raw`.
pub async fn connect(raw: &str) -> Result<Arc<dyn QueueBroker>> {
    match BrokerUrl::parse(raw)? {
        BrokerUrl::Memory => {
            warn!("Using in-memory broker: queues are not shared with other processes");
            Ok(Arc::new(MemoryBroker::new()))
        }
        BrokerUrl::Sqlite(path) => Ok(Arc::new(SqliteBroker::open(path).await?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_broker_urls() {
        assert_eq!(BrokerUrl::parse("memory:").unwrap(), BrokerUrl::Memory);
        assert_eq!(
            BrokerUrl::parse("sqlite:queues.sqlite").unwrap(),
            BrokerUrl::Sqlite(PathBuf::from("queues.sqlite"))
        );
        assert_eq!(
            BrokerUrl::parse("sqlite:///var/lib/chanflow/q.db").unwrap(),
            BrokerUrl::Sqlite(PathBuf::from("/var/lib/chanflow/q.db"))
        );
        assert!(matches!(
            BrokerUrl::parse("redis://redis:6379"),
            Err(BrokerError::InvalidUrl(_))
        ));
        assert!(BrokerUrl::parse("sqlite:").is_err());
    }
}

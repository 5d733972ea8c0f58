//! Process-local broker. Used by tests and single-process setups.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::{BrokerError, Result};
use crate::QueueBroker;

#[derive(Default)]
struct QueueSlot {
    items: Mutex<VecDeque<Vec<u8>>>,
    /// One permit per push; consumers re-check `items` after waking.
    ready: Notify,
}

impl QueueSlot {
    fn take(&self) -> Result<Option<Vec<u8>>> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| BrokerError::Unavailable("queue lock poisoned".to_string()))?;
        Ok(items.pop_front())
    }
}

/// In-memory FIFO queues. Clones share the same queues.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    queues: Arc<Mutex<HashMap<String, Arc<QueueSlot>>>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, queue: &str) -> Result<Arc<QueueSlot>> {
        let mut queues = self
            .queues
            .lock()
            .map_err(|_| BrokerError::Unavailable("broker lock poisoned".to_string()))?;
        Ok(Arc::clone(queues.entry(queue.to_string()).or_default()))
    }
}

#[async_trait]
impl QueueBroker for MemoryBroker {
    async fn push(&self, queue: &str, payload: Vec<u8>) -> Result<()> {
        let slot = self.slot(queue)?;
        {
            let mut items = slot
                .items
                .lock()
                .map_err(|_| BrokerError::Unavailable("queue lock poisoned".to_string()))?;
            items.push_back(payload);
        }
        slot.ready.notify_one();
        Ok(())
    }

    async fn pop(&self, queue: &str, timeout: Duration) -> Result<Option<Vec<u8>>> {
        let slot = self.slot(queue)?;
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(item) = slot.take()? {
                return Ok(Some(item));
            }
            if tokio::time::timeout_at(deadline, slot.ready.notified())
                .await
                .is_err()
            {
                return slot.take();
            }
        }
    }

    async fn depth(&self, queue: &str) -> Result<usize> {
        let slot = self.slot(queue)?;
        let items = slot
            .items
            .lock()
            .map_err(|_| BrokerError::Unavailable("queue lock poisoned".to_string()))?;
        Ok(items.len())
    }
}

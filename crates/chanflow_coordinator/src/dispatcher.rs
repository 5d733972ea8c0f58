//! Dispatcher: matches idle accounts with pending channels.
//!
//! Every tick claims at most one channel. The task is pushed while the claim
//! transaction is still open, so a failed push leaves the channel PENDING
//! and the next tick retries it.

use chanflow_broker::QueueBroker;
use chanflow_db::ChanflowDb;
use chanflow_protocol::defaults::{DISPATCH_INTERVAL_SECS, TASKS_QUEUE};
use chanflow_protocol::{HistoryTask, Task};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Time between ticks
    pub interval: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DISPATCH_INTERVAL_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Dispatched {
        channel: String,
        account_id: i64,
        min_id: i64,
    },
    /// No active account or no pending channel
    Idle,
}

pub struct Dispatcher {
    db: ChanflowDb,
    broker: Arc<dyn QueueBroker>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(db: ChanflowDb, broker: Arc<dyn QueueBroker>, config: DispatcherConfig) -> Self {
        Self { db, broker, config }
    }

    /// Tick forever at the configured interval. Tick failures are logged and
    /// the next tick proceeds on schedule.
    pub async fn run(&self) {
        info!(interval_ms = self.config.interval.as_millis() as u64, "Dispatcher started");
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = self.tick().await {
                error!("Dispatch tick failed: {}", e);
            }
        }
    }

    pub async fn tick(&self) -> Result<TickOutcome> {
        self.dispatch_one()
            .instrument(info_span!("dispatcher.tick"))
            .await
    }

    async fn dispatch_one(&self) -> Result<TickOutcome> {
        let Some(claim) = self.db.claim_next_dispatch().await? else {
            debug!("Nothing to dispatch");
            return Ok(TickOutcome::Idle);
        };

        let channel = claim.channel.handle.clone();
        let account_id = claim.account.id;
        let min_id = claim.channel.last_parsed_id;

        // An early return drops the claim, which rolls the status back
        let task = Task::History(HistoryTask::new(
            channel.clone(),
            min_id,
            claim.account.credentials(),
        ));
        let payload = task.encode()?;

        if let Err(e) = self.broker.push(TASKS_QUEUE, payload).await {
            if let Err(rollback) = claim.abandon().await {
                warn!(channel = %channel, "Rollback after failed push also failed: {}", rollback);
            }
            return Err(e.into());
        }
        claim.commit().await?;

        info!(channel = %channel, account_id, min_id, "Task dispatched");
        Ok(TickOutcome::Dispatched {
            channel,
            account_id,
            min_id,
        })
    }
}

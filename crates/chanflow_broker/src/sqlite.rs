//! Durable broker backed by a SQLite file.
//!
//! All queues share one table; the autoincrement id gives FIFO order. `pop`
//! claims the head row with a single `DELETE ... RETURNING`, so two consumers
//! can never receive the same payload. Waiting is done by polling.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

use crate::error::Result;
use crate::QueueBroker;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct SqliteBroker {
    pool: SqlitePool,
    poll_interval: Duration,
}

impl SqliteBroker {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS broker_queue (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                queue TEXT NOT NULL,
                payload BLOB NOT NULL,
                enqueued_at INTEGER NOT NULL
            )"#,
        )
        .execute(&pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_broker_queue_head ON broker_queue(queue, id)")
            .execute(&pool)
            .await?;

        info!(path = %path.display(), "Broker opened");

        Ok(Self {
            pool,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// How often a blocked `pop` re-checks the table.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(Duration::from_millis(1));
        self
    }

    async fn try_pop(&self, queue: &str) -> Result<Option<Vec<u8>>> {
        let payload: Option<Vec<u8>> = sqlx::query_scalar(
            r#"
            DELETE FROM broker_queue
            WHERE id = (
                SELECT id FROM broker_queue WHERE queue = ? ORDER BY id LIMIT 1
            )
            RETURNING payload
            "#,
        )
        .bind(queue)
        .fetch_optional(&self.pool)
        .await?;
        Ok(payload)
    }
}

#[async_trait]
impl QueueBroker for SqliteBroker {
    async fn push(&self, queue: &str, payload: Vec<u8>) -> Result<()> {
        sqlx::query("INSERT INTO broker_queue (queue, payload, enqueued_at) VALUES (?, ?, ?)")
            .bind(queue)
            .bind(payload)
            .bind(chrono::Utc::now().timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn pop(&self, queue: &str, timeout: Duration) -> Result<Option<Vec<u8>>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(payload) = self.try_pop(queue).await? {
                return Ok(Some(payload));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    async fn depth(&self, queue: &str) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM broker_queue WHERE queue = ?")
            .bind(queue)
            .fetch_one(&self.pool)
            .await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

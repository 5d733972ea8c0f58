//! Durable storage for the Chanflow pipeline
//!
//! Accounts, channels and scraped messages live in one SQLite database.
//! The dispatcher and the ingestor both write channel rows through this
//! crate; the dashboard reads the same tables.
//!
//! # Usage
//!
//! ```rust,ignore
//! use chanflow_db::ChanflowDb;
//!
//! let db = ChanflowDb::connect("sqlite:chanflow.sqlite").await?;
//! let channel = db.create_channel("@news").await?;
//!
//! if let Some(claim) = db.claim_next_dispatch().await? {
//!     // push the task, then make the PARSING transition durable
//!     claim.commit().await?;
//! }
//! ```

mod error;
mod schema;
mod types;

mod accounts;
mod channels;
mod dispatch;
mod messages;

pub use dispatch::DispatchClaim;
pub use error::{DbError, Result};
pub use types::*;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the Chanflow database. Cheap to clone (shares the pool).
#[derive(Clone)]
pub struct ChanflowDb {
    pool: SqlitePool,
}

impl ChanflowDb {
    /// Open from a `sqlite:<path>` URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let path = parse_sqlite_url(url)?;
        Self::open(path).await
    }

    /// Open or create a database at the given path.
    ///
    /// Creates all tables if they don't exist.
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
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;

        info!(path = %path.display(), "Database opened");

        Ok(db)
    }

    /// Escape hatch for queries the typed methods don't cover.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

// Timestamp utilities
impl ChanflowDb {
    /// Current time as milliseconds since Unix epoch.
    pub fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    pub fn millis_to_datetime(millis: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(millis).unwrap_or_default()
    }
}

/// Accepts `sqlite:<path>` and `sqlite://<path>`.
pub fn parse_sqlite_url(raw: &str) -> Result<PathBuf> {
    let rest = raw
        .strip_prefix("sqlite://")
        .or_else(|| raw.strip_prefix("sqlite:"))
        .ok_or_else(|| DbError::UnsupportedUrl(raw.to_string()))?;
    let path = rest.split('?').next().unwrap_or_default().trim();
    if path.is_empty() {
        return Err(DbError::UnsupportedUrl(format!("sqlite URL missing path: {raw}")));
    }
    Ok(PathBuf::from(path))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    pub async fn temp_db() -> (TempDir, ChanflowDb) {
        let tmp = TempDir::new().unwrap();
        let db = ChanflowDb::open(tmp.path().join("chanflow.sqlite")).await.unwrap();
        (tmp, db)
    }

    pub fn sample_account(phone: &str, active: bool) -> NewAccount {
        NewAccount {
            phone: phone.to_string(),
            api_id: 2040,
            api_hash: "b18441a1ff607e10a989891a5462e627".to_string(),
            session: format!("session-{phone}"),
            active,
            proxy_url: None,
        }
    }
}

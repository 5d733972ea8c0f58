//! Table definitions. All CREATE TABLE statements live here.

use crate::error::Result;
use crate::ChanflowDb;
use tracing::debug;

impl ChanflowDb {
    /// Ensure all tables exist.
    pub(crate) async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                phone TEXT NOT NULL,
                api_id INTEGER NOT NULL,
                api_hash TEXT NOT NULL,
                session TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                proxy_url TEXT,
                created_at INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS channels (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                handle TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL DEFAULT 'PENDING',
                last_parsed_id INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_channels_status ON channels(status)")
            .execute(&self.pool)
            .await?;

        // (channel_handle, external_id) is indexed but deliberately not UNIQUE:
        // a redelivered record produces a second row.
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                channel_handle TEXT NOT NULL,
                external_id INTEGER NOT NULL,
                text TEXT,
                date INTEGER NOT NULL,
                ingested_at INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_channel ON messages(channel_handle, external_id)",
        )
        .execute(&self.pool)
        .await?;

        debug!("Database schema verified");
        Ok(())
    }
}

//! Channel rows and their status transitions.

use crate::error::{DbError, Result};
use crate::types::*;
use crate::ChanflowDb;
use chanflow_protocol::ChannelStatus;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl ChanflowDb {
    /// Register a channel in `PENDING` with a zero watermark.
    pub async fn create_channel(&self, handle: &str) -> Result<Channel> {
        let handle = handle.trim();
        if handle.is_empty() {
            return Err(DbError::constraint("channel handle must not be empty"));
        }

        let now = Self::now_millis();
        let result = sqlx::query(
            r#"
            INSERT INTO channels (handle, status, last_parsed_id, created_at, updated_at)
            VALUES (?, ?, 0, ?, ?)
            "#,
        )
        .bind(handle)
        .bind(ChannelStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                DbError::constraint(format!("channel already exists: {handle}"))
            }
            other => DbError::from(other),
        })?;

        Ok(Channel {
            id: result.last_insert_rowid(),
            handle: handle.to_string(),
            status: ChannelStatus::Pending,
            last_parsed_id: 0,
        })
    }

    pub async fn get_channel(&self, id: i64) -> Result<Option<Channel>> {
        let row = sqlx::query("SELECT * FROM channels WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_channel).transpose()
    }

    pub async fn get_channel_by_handle(&self, handle: &str) -> Result<Option<Channel>> {
        let row = sqlx::query("SELECT * FROM channels WHERE handle = ?")
            .bind(handle)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_channel).transpose()
    }

    /// Newest first, as the dashboard lists them.
    pub async fn list_channels(&self) -> Result<Vec<Channel>> {
        let rows = sqlx::query("SELECT * FROM channels ORDER BY id DESC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_channel).collect()
    }

    pub async fn list_channels_by_status(&self, status: ChannelStatus) -> Result<Vec<Channel>> {
        let rows = sqlx::query("SELECT * FROM channels WHERE status = ? ORDER BY id")
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_channel).collect()
    }

    /// Apply a completion marker: `DONE` plus the new watermark.
    ///
    /// The watermark never moves backwards. Returns false when no channel
    /// has this handle (it may have been deleted while the task ran).
    pub async fn complete_channel(&self, handle: &str, max_id: i64) -> Result<bool> {
        let affected = sqlx::query(
            r#"
            UPDATE channels SET
                status = ?,
                last_parsed_id = MAX(last_parsed_id, ?),
                updated_at = ?
            WHERE handle = ?
            "#,
        )
        .bind(ChannelStatus::Done.as_str())
        .bind(max_id)
        .bind(Self::now_millis())
        .bind(handle)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected > 0)
    }

    /// Operator override (e.g. re-queue a stuck channel from the dashboard).
    pub async fn set_channel_status(&self, id: i64, status: ChannelStatus) -> Result<bool> {
        let affected = sqlx::query("UPDATE channels SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Self::now_millis())
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    pub async fn delete_channel(&self, id: i64) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM channels WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}

pub(crate) fn row_to_channel(row: &SqliteRow) -> Result<Channel> {
    let status: String = row.try_get("status")?;
    Ok(Channel {
        id: row.try_get("id")?,
        handle: row.try_get("handle")?,
        status: status.parse()?,
        last_parsed_id: row.try_get("last_parsed_id")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_db;

    #[tokio::test]
    async fn test_create_channel_defaults() {
        let (_tmp, db) = temp_db().await;

        let channel = db.create_channel(" @news ").await.unwrap();
        assert_eq!(channel.handle, "@news");
        assert_eq!(channel.status, ChannelStatus::Pending);
        assert_eq!(channel.last_parsed_id, 0);
        assert_eq!(db.get_channel(channel.id).await.unwrap(), Some(channel));
    }

    #[tokio::test]
    async fn test_duplicate_handle_is_constraint_error() {
        let (_tmp, db) = temp_db().await;

        db.create_channel("@news").await.unwrap();
        let err = db.create_channel("@news").await.unwrap_err();
        assert!(matches!(err, DbError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_complete_channel_sets_done_and_watermark() {
        let (_tmp, db) = temp_db().await;
        let channel = db.create_channel("@news").await.unwrap();

        assert!(db.complete_channel("@news", 110).await.unwrap());
        let done = db.get_channel(channel.id).await.unwrap().unwrap();
        assert_eq!(done.status, ChannelStatus::Done);
        assert_eq!(done.last_parsed_id, 110);

        // An older marker does not rewind the watermark
        assert!(db.complete_channel("@news", 90).await.unwrap());
        let done = db.get_channel(channel.id).await.unwrap().unwrap();
        assert_eq!(done.last_parsed_id, 110);

        assert!(!db.complete_channel("@missing", 5).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_by_status_and_delete() {
        let (_tmp, db) = temp_db().await;
        let a = db.create_channel("@a").await.unwrap();
        let b = db.create_channel("@b").await.unwrap();
        db.set_channel_status(b.id, ChannelStatus::Error).await.unwrap();

        let pending = db.list_channels_by_status(ChannelStatus::Pending).await.unwrap();
        assert_eq!(pending, vec![a.clone()]);

        let all = db.list_channels().await.unwrap();
        assert_eq!(all.iter().map(|c| c.handle.as_str()).collect::<Vec<_>>(), ["@b", "@a"]);

        assert!(db.delete_channel(a.id).await.unwrap());
        assert!(db.get_channel_by_handle("@a").await.unwrap().is_none());
    }
}

//! Scraped message rows.

use crate::error::Result;
use crate::types::*;
use crate::ChanflowDb;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl ChanflowDb {
    /// Insert one message and commit. No de-duplication on
    /// (channel, external id).
    pub async fn insert_message(&self, message: &NewMessage) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO messages (channel_handle, external_id, text, date, ingested_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.channel_handle)
        .bind(message.external_id)
        .bind(&message.text)
        .bind(message.date.timestamp_millis())
        .bind(Self::now_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Messages of one channel in external id order.
    pub async fn list_messages_for_channel(&self, handle: &str) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE channel_handle = ? ORDER BY external_id, id",
        )
        .bind(handle)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_message).collect()
    }

    pub async fn count_messages(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_messages_for_channel(&self, handle: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE channel_handle = ?")
            .bind(handle)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn row_to_message(row: &SqliteRow) -> Result<Message> {
    let date_millis: i64 = row.try_get("date")?;
    Ok(Message {
        id: row.try_get("id")?,
        channel_handle: row.try_get("channel_handle")?,
        external_id: row.try_get("external_id")?,
        text: row.try_get("text")?,
        date: ChanflowDb::millis_to_datetime(date_millis),
    })
}

//! Account/channel matching for the dispatcher.
//!
//! The claim runs inside one transaction. Its first statement moves the first
//! pending channel to `PARSING` with a conditional update
//! (`WHERE status = 'PENDING'`), then the first active account is read. The
//! caller pushes the task while the transaction is open and commits
//! afterwards; dropping the claim rolls the status change back.

use crate::accounts::row_to_account;
use crate::channels::row_to_channel;
use crate::error::Result;
use crate::types::*;
use crate::ChanflowDb;
use chanflow_protocol::ChannelStatus;
use sqlx::{Sqlite, Transaction};
use tracing::debug;

/// An account matched with a channel that is now `PARSING` (uncommitted).
pub struct DispatchClaim {
    tx: Transaction<'static, Sqlite>,
    pub account: Account,
    pub channel: Channel,
}

impl DispatchClaim {
    /// Make the `PENDING -> PARSING` transition durable.
    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Leave the channel `PENDING`.
    pub async fn abandon(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

impl ChanflowDb {
    /// Match one active account with one pending channel.
    ///
    /// Selection is "first row by id" for both tables; there is no fairness
    /// across accounts. Returns `None` (and changes nothing) when either side
    /// is missing or the channel was claimed concurrently.
    pub async fn claim_next_dispatch(&self) -> Result<Option<DispatchClaim>> {
        let mut tx = self.pool.begin().await?;

        // Writing first takes the write lock up front, so a concurrent commit
        // makes this statement wait instead of invalidating an earlier read
        let channel_row = sqlx::query(
            r#"
            UPDATE channels SET status = ?, updated_at = ?
            WHERE id = (SELECT id FROM channels WHERE status = ? ORDER BY id LIMIT 1)
              AND status = ?
            RETURNING *
            "#,
        )
        .bind(ChannelStatus::Parsing.as_str())
        .bind(Self::now_millis())
        .bind(ChannelStatus::Pending.as_str())
        .bind(ChannelStatus::Pending.as_str())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(channel_row) = channel_row else {
            tx.rollback().await?;
            debug!("No pending channel");
            return Ok(None);
        };
        let channel = row_to_channel(&channel_row)?;

        let account_row = sqlx::query("SELECT * FROM accounts WHERE active = 1 ORDER BY id LIMIT 1")
            .fetch_optional(&mut *tx)
            .await?;
        let Some(account_row) = account_row else {
            tx.rollback().await?;
            debug!("No active account");
            return Ok(None);
        };
        let account = row_to_account(&account_row)?;

        Ok(Some(DispatchClaim {
            tx,
            account,
            channel,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_account, temp_db};

    #[tokio::test]
    async fn test_no_active_account_claims_nothing() {
        let (_tmp, db) = temp_db().await;
        db.create_account(&sample_account("+1", false)).await.unwrap();
        let channel = db.create_channel("@news").await.unwrap();

        assert!(db.claim_next_dispatch().await.unwrap().is_none());
        let unchanged = db.get_channel(channel.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, ChannelStatus::Pending);
    }

    #[tokio::test]
    async fn test_no_pending_channel_claims_nothing() {
        let (_tmp, db) = temp_db().await;
        db.create_account(&sample_account("+1", true)).await.unwrap();
        let channel = db.create_channel("@news").await.unwrap();
        db.set_channel_status(channel.id, ChannelStatus::Done).await.unwrap();

        assert!(db.claim_next_dispatch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_moves_channel_to_parsing() {
        let (_tmp, db) = temp_db().await;
        db.create_account(&sample_account("+1", false)).await.unwrap();
        let active = db.create_account(&sample_account("+2", true)).await.unwrap();
        let first = db.create_channel("@first").await.unwrap();
        db.create_channel("@second").await.unwrap();

        let claim = db.claim_next_dispatch().await.unwrap().unwrap();
        assert_eq!(claim.account.id, active.id);
        assert_eq!(claim.channel.id, first.id);
        assert_eq!(claim.channel.status, ChannelStatus::Parsing);
        claim.commit().await.unwrap();

        let stored = db.get_channel(first.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ChannelStatus::Parsing);

        // The next claim moves on to the remaining pending channel
        let next = db.claim_next_dispatch().await.unwrap().unwrap();
        assert_eq!(next.channel.handle, "@second");
        next.abandon().await.unwrap();
    }

    #[tokio::test]
    async fn test_abandoned_claim_leaves_channel_pending() {
        let (_tmp, db) = temp_db().await;
        db.create_account(&sample_account("+1", true)).await.unwrap();
        let channel = db.create_channel("@news").await.unwrap();

        let claim = db.claim_next_dispatch().await.unwrap().unwrap();
        claim.abandon().await.unwrap();

        let stored = db.get_channel(channel.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ChannelStatus::Pending);
    }
}

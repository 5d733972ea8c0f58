//! Account rows. The pipeline only reads them; create/delete belong to the
//! dashboard surface.

use crate::error::Result;
use crate::types::*;
use crate::ChanflowDb;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

impl ChanflowDb {
    pub async fn create_account(&self, account: &NewAccount) -> Result<Account> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (phone, api_id, api_hash, session, active, proxy_url, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.phone)
        .bind(account.api_id)
        .bind(&account.api_hash)
        .bind(&account.session)
        .bind(account.active)
        .bind(&account.proxy_url)
        .bind(Self::now_millis())
        .execute(&self.pool)
        .await?;

        Ok(Account {
            id: result.last_insert_rowid(),
            phone: account.phone.clone(),
            api_id: account.api_id,
            api_hash: account.api_hash.clone(),
            session: account.session.clone(),
            active: account.active,
            proxy_url: account.proxy_url.clone(),
        })
    }

    pub async fn get_account(&self, id: i64) -> Result<Option<Account>> {
        let row = sqlx::query("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_account).transpose()
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query("SELECT * FROM accounts ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_account).collect()
    }

    pub async fn set_account_active(&self, id: i64, active: bool) -> Result<bool> {
        let affected = sqlx::query("UPDATE accounts SET active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    /// Returns false when no such account existed.
    pub async fn delete_account(&self, id: i64) -> Result<bool> {
        let affected = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}

pub(crate) fn row_to_account(row: &SqliteRow) -> Result<Account> {
    Ok(Account {
        id: row.try_get("id")?,
        phone: row.try_get("phone")?,
        api_id: row.try_get("api_id")?,
        api_hash: row.try_get("api_hash")?,
        session: row.try_get("session")?,
        active: row.try_get("active")?,
        proxy_url: row.try_get("proxy_url")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_account, temp_db};

    #[tokio::test]
    async fn test_account_lifecycle() {
        let (_tmp, db) = temp_db().await;

        let created = db.create_account(&sample_account("+15550001", true)).await.unwrap();
        let fetched = db.get_account(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.credentials().session, "session-+15550001");

        assert!(db.set_account_active(created.id, false).await.unwrap());
        assert!(!db.get_account(created.id).await.unwrap().unwrap().active);

        assert!(db.delete_account(created.id).await.unwrap());
        assert!(!db.delete_account(created.id).await.unwrap());
        assert!(db.list_accounts().await.unwrap().is_empty());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let account = Account {
            id: 1,
            phone: "+1".to_string(),
            api_id: 1,
            api_hash: "topsecret".to_string(),
            session: "sessionblob".to_string(),
            active: true,
            proxy_url: Some("socks5://u:p@h:1".to_string()),
        };
        let shown = format!("{account:?}");
        assert!(!shown.contains("topsecret"));
        assert!(!shown.contains("sessionblob"));
        assert!(!shown.contains("u:p"));
    }
}

//! Stored entities.

use chanflow_protocol::{ChannelStatus, Credentials, MessageRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

// ============================================================================
// Accounts
// ============================================================================

/// A credentialed account that workers log in with.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: i64,
    pub phone: String,
    pub api_id: i64,
    #[serde(skip_serializing)]
    pub api_hash: String,
    #[serde(skip_serializing)]
    pub session: String,
    pub active: bool,
    pub proxy_url: Option<String>,
}

impl Account {
    /// Snapshot copied into a task at dispatch time.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            session: self.session.clone(),
            api_id: self.api_id,
            api_hash: self.api_hash.clone(),
            proxy: self.proxy_url.clone(),
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("phone", &self.phone)
            .field("api_id", &self.api_id)
            .field("active", &self.active)
            .field("proxy_url", &self.proxy_url.as_ref().map(|_| "<set>"))
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct NewAccount {
    pub phone: String,
    pub api_id: i64,
    pub api_hash: String,
    pub session: String,
    pub active: bool,
    pub proxy_url: Option<String>,
}

// ============================================================================
// Channels
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Channel {
    pub id: i64,
    /// External handle, e.g. `@news`. Unique.
    pub handle: String,
    pub status: ChannelStatus,
    /// Highest ingested external message id
    pub last_parsed_id: i64,
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: i64,
    pub channel_handle: String,
    pub external_id: i64,
    pub text: Option<String>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub channel_handle: String,
    pub external_id: i64,
    pub text: Option<String>,
    pub date: DateTime<Utc>,
}

impl From<MessageRecord> for NewMessage {
    fn from(record: MessageRecord) -> Self {
        Self {
            channel_handle: record.channel,
            external_id: record.external_id,
            text: record.text,
            date: record.timestamp,
        }
    }
}

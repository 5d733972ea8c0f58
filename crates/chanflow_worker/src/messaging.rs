//! Messaging capability seam.
//!
//! Workers never talk to the messaging network directly. A
//! [`MessagingConnector`] builds a [`MessagingClient`] from the account
//! credentials carried by a task; the client handles handshake, auth and
//! message iteration.

use async_trait::async_trait;
use chanflow_protocol::ProxyConfig;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Client is not connected")]
    NotConnected,

    #[error("Channel not available: {0}")]
    ChannelUnavailable(String),

    #[error("Messaging I/O error: {0}")]
    Io(String),

    #[error("Invalid fixture: {0}")]
    Fixture(String),
}

/// What a client needs to log in as an account.
#[derive(Clone)]
pub struct SessionCredentials {
    pub session: String,
    pub api_id: i64,
    pub api_hash: String,
    pub proxy: Option<ProxyConfig>,
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("api_id", &self.api_id)
            .field("proxy", &self.proxy.as_ref().map(ToString::to_string))
            .finish_non_exhaustive()
    }
}

/// One message as returned by the capability.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FetchedMessage {
    pub id: i64,
    #[serde(default)]
    pub text: Option<String>,
    pub date: DateTime<Utc>,
}

/// Finite, non-restartable sequence of messages.
pub type MessageStream<'a> = BoxStream<'a, Result<FetchedMessage, MessagingError>>;

#[async_trait]
pub trait MessagingConnector: Send + Sync {
    /// Build an unconnected client for one account.
    async fn build(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<Box<dyn MessagingClient>, MessagingError>;
}

#[async_trait]
pub trait MessagingClient: Send {
    async fn connect(&mut self) -> Result<(), MessagingError>;

    /// False when the session token is invalid or expired.
    async fn is_authorized(&mut self) -> Result<bool, MessagingError>;

    /// Lazy sequence of messages of `channel` with id greater than `min_id`,
    /// at most `limit` items. Failures surface as stream items.
    fn iter_messages(&mut self, channel: &str, min_id: i64, limit: usize) -> MessageStream<'_>;

    async fn disconnect(&mut self) -> Result<(), MessagingError>;
}

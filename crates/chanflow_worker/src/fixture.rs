//! Replay capability backed by a JSON fixture.
//!
//! ```json
//! {
//!   "authorized_sessions": ["session-a"],
//!   "channels": {
//!     "@news": [{"id": 101, "text": "hello", "date": "2024-05-01T12:00:00Z"}]
//!   }
//! }
//! ```
//!
//! Omitting `authorized_sessions` authorizes every session. Messages are
//! served newest first, the way the live network returns history.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::messaging::{
    FetchedMessage, MessageStream, MessagingClient, MessagingConnector, MessagingError,
    SessionCredentials,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureData {
    #[serde(default)]
    authorized_sessions: Option<HashSet<String>>,
    #[serde(default)]
    channels: HashMap<String, Vec<FetchedMessage>>,
}

impl FixtureData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(raw: &str) -> Result<Self, MessagingError> {
        serde_json::from_str(raw).map_err(|e| MessagingError::Fixture(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MessagingError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| MessagingError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    /// Restrict authorization to the listed sessions (cumulative).
    pub fn authorize(mut self, session: impl Into<String>) -> Self {
        self.authorized_sessions
            .get_or_insert_with(HashSet::new)
            .insert(session.into());
        self
    }

    pub fn with_channel(mut self, handle: impl Into<String>, messages: Vec<FetchedMessage>) -> Self {
        self.channels.insert(handle.into(), messages);
        self
    }

    fn is_authorized(&self, session: &str) -> bool {
        self.authorized_sessions
            .as_ref()
            .map_or(true, |sessions| sessions.contains(session))
    }

    fn history(&self, channel: &str, min_id: i64, limit: usize) -> Option<Vec<FetchedMessage>> {
        let mut messages: Vec<FetchedMessage> = self
            .channels
            .get(channel)?
            .iter()
            .filter(|m| m.id > min_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.id.cmp(&a.id));
        messages.truncate(limit);
        Some(messages)
    }
}

/// Builds [`FixtureClient`]s sharing one fixture.
#[derive(Debug, Clone)]
pub struct FixtureConnector {
    data: Arc<FixtureData>,
}

impl FixtureConnector {
    pub fn new(data: FixtureData) -> Self {
        Self {
            data: Arc::new(data),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MessagingError> {
        Ok(Self::new(FixtureData::from_path(path)?))
    }
}

#[async_trait]
impl MessagingConnector for FixtureConnector {
    async fn build(
        &self,
        credentials: &SessionCredentials,
    ) -> Result<Box<dyn MessagingClient>, MessagingError> {
        Ok(Box::new(FixtureClient {
            data: Arc::clone(&self.data),
            session: credentials.session.clone(),
            connected: false,
        }))
    }
}

pub struct FixtureClient {
    data: Arc<FixtureData>,
    session: String,
    connected: bool,
}

#[async_trait]
impl MessagingClient for FixtureClient {
    async fn connect(&mut self) -> Result<(), MessagingError> {
        self.connected = true;
        Ok(())
    }

    async fn is_authorized(&mut self) -> Result<bool, MessagingError> {
        if !self.connected {
            return Err(MessagingError::NotConnected);
        }
        Ok(self.data.is_authorized(&self.session))
    }

    fn iter_messages(&mut self, channel: &str, min_id: i64, limit: usize) -> MessageStream<'_> {
        let err = if !self.connected {
            MessagingError::NotConnected
        } else if let Some(messages) = self.data.history(channel, min_id, limit) {
            debug!(channel, min_id, count = messages.len(), "Replaying fixture history");
            return stream::iter(messages.into_iter().map(Ok::<_, MessagingError>)).boxed();
        } else {
            MessagingError::ChannelUnavailable(channel.to_string())
        };
        stream::once(async move { Err::<FetchedMessage, _>(err) }).boxed()
    }

    async fn disconnect(&mut self) -> Result<(), MessagingError> {
        self.connected = false;
        Ok(())
    }
}

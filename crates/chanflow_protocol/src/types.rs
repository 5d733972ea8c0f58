//! Protocol payload types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{ProtocolError, Result};

// ============================================================================
// Canonical Enums
// ============================================================================

/// Channel lifecycle. Transitions only move forward:
/// `Pending -> Parsing -> {Done, Error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelStatus {
    /// Waiting for the dispatcher
    #[default]
    Pending,
    /// A history task was emitted and has not completed yet
    Parsing,
    /// Completion marker ingested
    Done,
    Error,
}

impl ChannelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelStatus::Pending => "PENDING",
            ChannelStatus::Parsing => "PARSING",
            ChannelStatus::Done => "DONE",
            ChannelStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChannelStatus {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(ChannelStatus::Pending),
            "PARSING" => Ok(ChannelStatus::Parsing),
            "DONE" => Ok(ChannelStatus::Done),
            "ERROR" => Ok(ChannelStatus::Error),
            _ => Err(ProtocolError::InvalidStatus(s.to_string())),
        }
    }
}

// ============================================================================
// tasks_queue (Dispatcher -> Worker)
// ============================================================================

/// Account credentials snapshot carried inside a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub session: String,
    pub api_id: i64,
    pub api_hash: String,
    pub proxy: Option<String>,
}

/// Work item popped by workers. The `type` tag selects the variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Task {
    History(HistoryTask),
}

/// Fetch the history of one channel above `min_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTask {
    #[serde(rename = "channel_username")]
    pub channel: String,
    #[serde(default)]
    pub min_id: i64,
    pub session: String,
    pub api_id: i64,
    pub api_hash: String,
    #[serde(default)]
    pub proxy: Option<String>,
}

impl HistoryTask {
    pub fn new(channel: impl Into<String>, min_id: i64, credentials: Credentials) -> Self {
        Self {
            channel: channel.into(),
            min_id,
            session: credentials.session,
            api_id: credentials.api_id,
            api_hash: credentials.api_hash,
            proxy: credentials.proxy,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            session: self.session.clone(),
            api_id: self.api_id,
            api_hash: self.api_hash.clone(),
            proxy: self.proxy.clone(),
        }
    }
}

impl Task {
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }
}

// ============================================================================
// results_queue (Worker -> Ingestor)
// ============================================================================

/// One fetched message, streamed as soon as the worker sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub channel: String,
    #[serde(rename = "id")]
    pub external_id: i64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,
}

/// Emitted once per finished task with the highest id observed
/// (or the task's `min_id` when nothing was fetched).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMarker {
    pub channel: String,
    pub max_id: i64,
}

/// Result payload. On the wire, messages are tagged with `"type": "message"`
/// and completion markers with `"status": "done"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeResult {
    Message(MessageRecord),
    Completion(CompletionMarker),
}

#[derive(Serialize)]
struct TaggedMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    record: &'a MessageRecord,
}

#[derive(Serialize)]
struct TaggedCompletion<'a> {
    status: &'static str,
    #[serde(flatten)]
    marker: &'a CompletionMarker,
}

impl ScrapeResult {
    pub fn channel(&self) -> &str {
        match self {
            ScrapeResult::Message(record) => &record.channel,
            ScrapeResult::Completion(marker) => &marker.channel,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let bytes = match self {
            ScrapeResult::Message(record) => serde_json::to_vec(&TaggedMessage {
                kind: "message",
                record,
            })?,
            ScrapeResult::Completion(marker) => serde_json::to_vec(&TaggedCompletion {
                status: "done",
                marker,
            })?,
        };
        Ok(bytes)
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(payload)?;

        if value.get("type").and_then(Value::as_str) == Some("message") {
            return Ok(ScrapeResult::Message(serde_json::from_value(value)?));
        }
        if value.get("status").and_then(Value::as_str) == Some("done") {
            return Ok(ScrapeResult::Completion(serde_json::from_value(value)?));
        }

        let mut shown = value.to_string();
        if shown.len() > 200 {
            let mut cut = 200;
            while !shown.is_char_boundary(cut) {
                cut -= 1;
            }
            shown.truncate(cut);
            shown.push_str("...");
        }
        Err(ProtocolError::UnrecognizedResult(shown))
    }
}

impl From<MessageRecord> for ScrapeResult {
    fn from(record: MessageRecord) -> Self {
        ScrapeResult::Message(record)
    }
}

impl From<CompletionMarker> for ScrapeResult {
    fn from(marker: CompletionMarker) -> Self {
        ScrapeResult::Completion(marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn credentials() -> Credentials {
        Credentials {
            session: "1BVtsOK4Bu".to_string(),
            api_id: 12345,
            api_hash: "0123456789abcdef".to_string(),
            proxy: None,
        }
    }

    #[test]
    fn test_history_task_wire_fields() {
        let task = Task::History(HistoryTask::new("@news", 42, credentials()));
        let value: Value = serde_json::from_slice(&task.encode().unwrap()).unwrap();

        assert_eq!(value["type"], "history");
        assert_eq!(value["channel_username"], "@news");
        assert_eq!(value["min_id"], 42);
        assert_eq!(value["session"], "1BVtsOK4Bu");
        assert_eq!(value["api_id"], 12345);
        assert_eq!(value["api_hash"], "0123456789abcdef");
        assert!(value["proxy"].is_null());
    }

    #[test]
    fn test_task_decode_defaults_missing_min_id() {
        let raw = br#"{"type":"history","channel_username":"@news","session":"s","api_id":1,"api_hash":"h"}"#;
        let Task::History(task) = Task::decode(raw).unwrap();
        assert_eq!(task.min_id, 0);
        assert_eq!(task.proxy, None);
    }

    #[test]
    fn test_task_decode_rejects_unknown_type() {
        let raw = br#"{"type":"members","channel_username":"@news","session":"s","api_id":1,"api_hash":"h"}"#;
        let err = Task::decode(raw).unwrap_err();
        assert!(err.is_malformed_payload());
    }

    #[test]
    fn test_message_record_wire_shape() {
        let record = MessageRecord {
            channel: "@news".to_string(),
            external_id: 101,
            text: Some("hello".to_string()),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        };
        let bytes = ScrapeResult::from(record.clone()).encode().unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["type"], "message");
        assert_eq!(value["channel"], "@news");
        assert_eq!(value["id"], 101);
        assert_eq!(value["text"], "hello");
        assert_eq!(value["date"], "2024-03-01T12:00:00Z");

        assert_eq!(ScrapeResult::decode(&bytes).unwrap(), ScrapeResult::Message(record));
    }

    #[test]
    fn test_decode_message_with_offset_date_and_null_text() {
        let raw = br#"{"type":"message","channel":"@news","id":7,"text":null,"date":"2024-03-01T15:00:00+03:00"}"#;
        let ScrapeResult::Message(record) = ScrapeResult::decode(raw).unwrap() else {
            panic!("expected message record");
        };
        assert_eq!(record.text, None);
        assert_eq!(record.timestamp, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_completion_marker_wire_shape() {
        let marker = CompletionMarker {
            channel: "@news".to_string(),
            max_id: 110,
        };
        let bytes = ScrapeResult::from(marker.clone()).encode().unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["status"], "done");
        assert_eq!(value["max_id"], 110);
        assert!(value.get("type").is_none());
        assert_eq!(ScrapeResult::decode(&bytes).unwrap(), ScrapeResult::Completion(marker));
    }

    #[test]
    fn test_decode_rejects_unknown_shapes() {
        let err = ScrapeResult::decode(br#"{"status":"failed","channel":"@news"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnrecognizedResult(_)));

        let err = ScrapeResult::decode(b"not json").unwrap_err();
        assert!(matches!(err, ProtocolError::Json(_)));

        // Known tag but missing required field
        let err = ScrapeResult::decode(br#"{"status":"done","channel":"@news"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Json(_)));
    }

    #[test]
    fn test_channel_status_parse() {
        assert_eq!("parsing".parse::<ChannelStatus>().unwrap(), ChannelStatus::Parsing);
        assert_eq!(ChannelStatus::Done.to_string(), "DONE");
        assert!("QUEUED".parse::<ChannelStatus>().is_err());
    }
}

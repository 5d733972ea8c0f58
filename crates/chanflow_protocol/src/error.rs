//! Protocol errors.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Payload is not valid JSON or does not match the expected fields
    #[error("Malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON object carries neither a known `type` nor a known `status` tag
    #[error("Unrecognized result payload: {0}")]
    UnrecognizedResult(String),

    #[error("Invalid proxy URL '{url}': {reason}")]
    InvalidProxy { url: String, reason: String },

    #[error("Invalid channel status: '{0}'")]
    InvalidStatus(String),
}

impl ProtocolError {
    pub fn invalid_proxy(url: &str, reason: impl Into<String>) -> Self {
        Self::InvalidProxy {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// True when the error comes from the shape of an incoming payload.
    pub fn is_malformed_payload(&self) -> bool {
        matches!(self, Self::Json(_) | Self::UnrecognizedResult(_))
    }
}

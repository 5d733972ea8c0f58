//! Error types for the storage layer.

use chanflow_protocol::ProtocolError;
use thiserror::Error;

/// Database operation result type.
pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error (connection, query, etc.)
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unique handle already taken, etc.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Row content that does not map back to a domain value
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Unsupported database URL: {0}")]
    UnsupportedUrl(String),
}

impl DbError {
    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }
}

impl From<ProtocolError> for DbError {
    fn from(err: ProtocolError) -> Self {
        Self::Corrupt(err.to_string())
    }
}

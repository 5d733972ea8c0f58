use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrokerError>;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Broker database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid broker URL: {0}")]
    InvalidUrl(String),

    #[error("Broker unavailable: {0}")]
    Unavailable(String),
}

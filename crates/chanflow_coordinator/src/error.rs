//! Coordinator errors.

use chanflow_broker::BrokerError;
use chanflow_db::DbError;
use chanflow_protocol::ProtocolError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoordinatorError>;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A component loop ended, which only happens if its task panicked
    #[error("{component} loop stopped: {reason}")]
    LoopStopped {
        component: &'static str,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_errors_keep_their_own_message() {
        let db = CoordinatorError::from(DbError::constraint("channel already exists: @news"));
        assert_eq!(db.to_string(), "Constraint violation: channel already exists: @news");

        let broker = CoordinatorError::from(BrokerError::Unavailable("refused".to_string()));
        assert_eq!(broker.to_string(), "Broker unavailable: refused");
    }
}

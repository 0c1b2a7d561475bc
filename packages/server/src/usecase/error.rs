//! UseCase layer error types.

use thiserror::Error;

/// The broker task is gone (server shutting down)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    #[error("broker is not running")]
    Stopped,
}

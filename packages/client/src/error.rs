//! Error types for the terminal client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Identity rejected before connecting (empty room, name or user id)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

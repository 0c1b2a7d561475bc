//! Domain error types.

use thiserror::Error;

/// Validation failure of a value object
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Rejection of a call request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// No other member of the room is available for a call
    #[error("no peers available for a call")]
    NoPeersAvailable,

    /// The caller is already calling, ringing or connected
    #[error("connection is already in a call")]
    Busy,

    /// The caller is not a member of the room
    #[error("connection is not a member of the room")]
    NotAMember,
}

/// Failure to push an outbound message to a connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("connection '{0}' not found")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// Failure of the trace/visualization collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceServiceError {
    #[error("language '{0}' is not supported")]
    UnsupportedLanguage(String),

    #[error("trace service responded with status {status}")]
    Upstream { status: u16, body: String },

    #[error("trace service unreachable: {0}")]
    Network(String),

    #[error("unexpected trace service response: {0}")]
    Decode(String),
}

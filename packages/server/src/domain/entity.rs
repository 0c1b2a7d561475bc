//! Domain entities held by the relay.

use serde::Serialize;

use super::value_object::{ConnectionId, DisplayName, MessageText, Timestamp, UserId};

/// One connection's presence in a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresenceRecord {
    pub user_id: UserId,
    pub display_name: DisplayName,
    pub connection_id: ConnectionId,
    pub is_available_for_call: bool,
}

impl PresenceRecord {
    /// Fresh record; a connection that just joined is available for calls.
    pub fn new(user_id: UserId, display_name: DisplayName, connection_id: ConnectionId) -> Self {
        Self {
            user_id,
            display_name,
            connection_id,
            is_available_for_call: true,
        }
    }
}

/// Chat message, immutable once appended to a room's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub text: MessageText,
    /// Display name of the sender as the sender's client reported it
    pub sender: String,
    pub sender_user_id: UserId,
    pub timestamp: Timestamp,
}

impl ChatMessage {
    pub fn new(
        text: MessageText,
        sender: String,
        sender_user_id: UserId,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            text,
            sender,
            sender_user_id,
            timestamp,
        }
    }
}

/// Per-connection call state.
///
/// `Busy` is not a state: it is the rejection of a request made while not `Idle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallState {
    Idle,
    /// Requested a call; waiting for `peer` to accept
    Calling { peer: ConnectionId },
    /// Was chosen as the target of `peer`'s request
    Receiving { peer: ConnectionId },
    Connected { peer: ConnectionId },
}

impl CallState {
    pub fn peer(&self) -> Option<&ConnectionId> {
        match self {
            CallState::Idle => None,
            CallState::Calling { peer }
            | CallState::Receiving { peer }
            | CallState::Connected { peer } => Some(peer),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, CallState::Idle)
    }
}

//! Domain logic for client-side operations.
//!
//! Pure functions and state transitions, kept free of I/O so they are easy to
//! test.

use kyodo_server::infrastructure::dto::websocket::{
    ChatMessageDto, ClientEvent, PresenceDto, ServerEvent,
};

use crate::{command::InputCommand, error::ClientError};

/// Check if the client should exit immediately based on the error type.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(error, ClientError::InvalidArgument(_))
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    // Don't reconnect if the error requires immediate exit
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}

/// What the client knows about its own session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub room: String,
    pub user_id: String,
    pub display_name: String,
    /// Assigned by the relay in the `connected` frame
    pub connection_id: Option<String>,
    pub joined: bool,
    /// Latest presence list of the room
    pub users: Vec<PresenceDto>,
    pub pending_caller: Option<String>,
    pub partner: Option<String>,
}

impl SessionState {
    pub fn new(room: String, user_id: String, display_name: String) -> Self {
        Self {
            room,
            user_id,
            display_name,
            connection_id: None,
            joined: false,
            users: Vec::new(),
            pending_caller: None,
            partner: None,
        }
    }

    pub fn join_event(&mut self) -> ClientEvent {
        self.joined = true;
        ClientEvent::JoinRoom {
            room: self.room.clone(),
            user_id: self.user_id.clone(),
            display_name: self.display_name.clone(),
        }
    }

    /// Track what the relay told us
    pub fn apply(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::Connected { connection_id } => {
                self.connection_id = Some(connection_id.clone());
            }
            ServerEvent::RoomUsersUpdate { room, users } if *room == self.room => {
                self.users = users.clone();
            }
            ServerEvent::IncomingCall {
                caller_connection_id,
                ..
            } => {
                self.pending_caller = Some(caller_connection_id.clone());
            }
            ServerEvent::CallEstablished {
                remote_connection_id,
            } => {
                self.partner = Some(remote_connection_id.clone());
                self.pending_caller = None;
            }
            ServerEvent::CallEnded { .. } => {
                self.partner = None;
                self.pending_caller = None;
            }
            ServerEvent::CallEndedByDisconnect {
                disconnected_connection_id,
            } => {
                if self.partner.as_ref() == Some(disconnected_connection_id) {
                    self.partner = None;
                }
                if self.pending_caller.as_ref() == Some(disconnected_connection_id) {
                    self.pending_caller = None;
                }
            }
            _ => {}
        }
    }

    /// Frame to send for a prompt command, if any.
    ///
    /// `now_millis` stamps outgoing chat messages.
    pub fn event_for(&mut self, command: &InputCommand, now_millis: i64) -> Option<ClientEvent> {
        if !self.joined {
            return None;
        }

        let room = self.room.clone();
        match command {
            InputCommand::Chat(text) => Some(ClientEvent::SendMessage {
                room,
                message: ChatMessageDto {
                    text: text.clone(),
                    sender: self.display_name.clone(),
                    user_id: self.user_id.clone(),
                    timestamp: Some(now_millis),
                },
            }),
            InputCommand::Call => Some(ClientEvent::CallRequest {
                room,
                caller_display_name: Some(self.display_name.clone()),
                // No media on a terminal: the call carries no SDP offer.
                offer: serde_json::Value::Null,
            }),
            InputCommand::Accept(id) => {
                let caller = id.clone().or_else(|| self.pending_caller.clone())?;
                Some(ClientEvent::CallAccepted {
                    room,
                    caller_connection_id: caller,
                })
            }
            InputCommand::Hangup => Some(ClientEvent::CallEnded { room }),
            InputCommand::Leave => {
                self.joined = false;
                self.users.clear();
                self.partner = None;
                self.pending_caller = None;
                Some(ClientEvent::LeaveRoom { room })
            }
            InputCommand::Who
            | InputCommand::Help
            | InputCommand::Quit
            | InputCommand::Unknown(_) => None,
        }
    }
}

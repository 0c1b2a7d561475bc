//! Message formatting utilities for client display.

use kyodo_server::infrastructure::dto::websocket::{CallEndReasonDto, PresenceDto, ServerEvent};
use kyodo_shared::time::timestamp_to_rfc3339;

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Render one relay frame; `me` is this client's connection id
    pub fn format_event(event: &ServerEvent, me: Option<&str>) -> String {
        match event {
            ServerEvent::Connected { connection_id } => {
                format!("\nConnected as {}\n", connection_id)
            }
            ServerEvent::RoomUsersUpdate { room, users } => {
                Self::format_presence(room, users, me)
            }
            ServerEvent::ReceiveMessage { message } => Self::format_chat_message(
                &message.sender,
                &message.text,
                message.timestamp,
            ),
            ServerEvent::CodeUpdate {
                file_id,
                content,
                sender_connection_id,
            } => format!(
                "\n~ {} updated {} ({} bytes)\n",
                sender_connection_id,
                file_id,
                content.len()
            ),
            ServerEvent::IncomingCall {
                caller_connection_id,
                caller_display_name,
            } => format!(
                "\n☎ Incoming call from {} ({}). Type /accept to answer.\n",
                caller_display_name, caller_connection_id
            ),
            ServerEvent::WebrtcOffer {
                sender_connection_id,
                ..
            }
            | ServerEvent::WebrtcAnswer {
                sender_connection_id,
                ..
            }
            | ServerEvent::WebrtcIceCandidate {
                sender_connection_id,
                ..
            } => format!("\n· signaling from {}\n", sender_connection_id),
            ServerEvent::CallEstablished {
                remote_connection_id,
            } => format!("\n☎ Call established with {}\n", remote_connection_id),
            ServerEvent::CallEnded { reason } => {
                format!("\n☎ Call ended: {}\n", Self::describe_reason(*reason))
            }
            ServerEvent::CallEndedByDisconnect {
                disconnected_connection_id,
            } => format!("\n- {} disconnected\n", disconnected_connection_id),
        }
    }

    /// Format the member list of a room
    ///
    /// # Arguments
    ///
    /// * `room` - Room name
    /// * `users` - Members in join order
    /// * `me` - The current client's connection id (to mark as "me")
    pub fn format_presence(room: &str, users: &[PresenceDto], me: Option<&str>) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n\n{}\n", RULE));
        output.push_str(&format!("Members of '{}':\n", room));

        if users.is_empty() {
            output.push_str("(No members)\n");
        } else {
            for user in users {
                let me_suffix = if Some(user.connection_id.as_str()) == me {
                    " (me)"
                } else {
                    ""
                };
                let status = if user.is_available_for_call {
                    "available"
                } else {
                    "in a call"
                };
                output.push_str(&format!(
                    "{}{} [{}] - {}\n",
                    user.display_name, me_suffix, user.connection_id, status
                ));
            }
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }

    /// Format a chat message
    pub fn format_chat_message(sender: &str, text: &str, sent_at: Option<i64>) -> String {
        let sent = sent_at
            .map(timestamp_to_rfc3339)
            .unwrap_or_else(|| "unknown time".to_string());
        format!(
            "\n\n{rule}\n@{}: {}\nsent at {}\n{rule}\n",
            sender,
            text,
            sent,
            rule = THIN_RULE
        )
    }

    /// Format a raw text frame (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }

    fn describe_reason(reason: CallEndReasonDto) -> &'static str {
        match reason {
            CallEndReasonDto::NoAvailablePeers => "nobody is available",
            CallEndReasonDto::Busy => "you are already in a call",
            CallEndReasonDto::PartnerEnded => "the other side hung up",
            CallEndReasonDto::PartnerDisconnected => "the other side disconnected",
        }
    }
}

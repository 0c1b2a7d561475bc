//! Inbound relay events and outbound notices, independent of the wire format.

use super::{
    entity::{ChatMessage, PresenceRecord},
    value_object::{ConnectionId, DisplayName, MessageText, RoomName, Timestamp, UserId},
};

/// Opaque signaling payload (SDP offer/answer, ICE candidate) relayed untouched
pub type SignalPayload = serde_json::Value;

/// Kind of WebRTC signaling message being relayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

/// Event received from a connection, already validated
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    JoinRoom {
        room: RoomName,
        user_id: UserId,
        display_name: DisplayName,
    },
    LeaveRoom {
        room: RoomName,
    },
    CodeChange {
        room: RoomName,
        file_id: String,
        content: String,
    },
    SendMessage {
        room: RoomName,
        text: MessageText,
        sender: String,
        sender_user_id: UserId,
        /// Client-side send time; the relay stamps its own when absent
        timestamp: Option<Timestamp>,
    },
    CallRequest {
        room: RoomName,
        offer: SignalPayload,
    },
    CallAccepted {
        room: RoomName,
        caller: ConnectionId,
    },
    CallEnded {
        room: RoomName,
    },
    Signal {
        kind: SignalKind,
        target: ConnectionId,
        payload: SignalPayload,
    },
}

impl RelayEvent {
    /// Event name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            RelayEvent::JoinRoom { .. } => "join-room",
            RelayEvent::LeaveRoom { .. } => "leave-room",
            RelayEvent::CodeChange { .. } => "code-change",
            RelayEvent::SendMessage { .. } => "send-message",
            RelayEvent::CallRequest { .. } => "call-request",
            RelayEvent::CallAccepted { .. } => "call-accepted",
            RelayEvent::CallEnded { .. } => "call-ended",
            RelayEvent::Signal {
                kind: SignalKind::Offer,
                ..
            } => "webrtc-offer",
            RelayEvent::Signal {
                kind: SignalKind::Answer,
                ..
            } => "webrtc-answer",
            RelayEvent::Signal {
                kind: SignalKind::IceCandidate,
                ..
            } => "webrtc-ice-candidate",
        }
    }
}

/// Why a call ended, as told to the party left behind (or to the caller)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallEndReason {
    NoAvailablePeers,
    PartnerEnded,
    PartnerDisconnected,
}

/// Notice sent to one or more connections
#[derive(Debug, Clone, PartialEq)]
pub enum RelayNotice {
    Connected {
        connection_id: ConnectionId,
    },
    RoomUsersUpdate {
        room: RoomName,
        users: Vec<PresenceRecord>,
    },
    ReceiveMessage(ChatMessage),
    CodeUpdate {
        file_id: String,
        content: String,
        sender: ConnectionId,
    },
    IncomingCall {
        caller: ConnectionId,
        caller_display_name: DisplayName,
    },
    Signal {
        kind: SignalKind,
        sender: ConnectionId,
        payload: SignalPayload,
    },
    CallEstablished {
        remote: ConnectionId,
    },
    CallEnded {
        reason: CallEndReason,
    },
    /// A call request was refused because the caller is already in a call
    CallRejectedBusy,
    CallEndedByDisconnect {
        disconnected: ConnectionId,
    },
}

/// One outbound notice and the connections it goes to
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub targets: Vec<ConnectionId>,
    pub notice: RelayNotice,
}

impl Delivery {
    pub fn unicast(target: ConnectionId, notice: RelayNotice) -> Self {
        Self {
            targets: vec![target],
            notice,
        }
    }

    pub fn to_members(members: &[PresenceRecord], notice: RelayNotice) -> Self {
        Self {
            targets: members.iter().map(|m| m.connection_id.clone()).collect(),
            notice,
        }
    }
}

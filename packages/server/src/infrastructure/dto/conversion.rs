//! Conversion logic between DTOs and domain types.

use crate::domain::{
    CallEndReason, ChatMessage, ConnectionId, DisplayName, MessageText, PresenceRecord,
    RelayEvent, RelayNotice, RoomName, SignalKind, Timestamp, UserId, ValueObjectError,
};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// DTO → Domain
// ========================================

impl TryFrom<dto::ClientEvent> for RelayEvent {
    type Error = ValueObjectError;

    fn try_from(event: dto::ClientEvent) -> Result<Self, Self::Error> {
        let relay_event = match event {
            dto::ClientEvent::JoinRoom {
                room,
                user_id,
                display_name,
            } => RelayEvent::JoinRoom {
                room: RoomName::new(room)?,
                user_id: UserId::new(user_id)?,
                display_name: DisplayName::new(display_name)?,
            },
            dto::ClientEvent::LeaveRoom { room } => RelayEvent::LeaveRoom {
                room: RoomName::new(room)?,
            },
            dto::ClientEvent::CodeChange {
                room,
                file_id,
                content,
            } => RelayEvent::CodeChange {
                room: RoomName::new(room)?,
                file_id,
                content,
            },
            dto::ClientEvent::SendMessage { room, message } => RelayEvent::SendMessage {
                room: RoomName::new(room)?,
                text: MessageText::new(message.text)?,
                sender: message.sender,
                sender_user_id: UserId::new(message.user_id)?,
                timestamp: message.timestamp.map(Timestamp::new),
            },
            dto::ClientEvent::CallRequest { room, offer, .. } => RelayEvent::CallRequest {
                room: RoomName::new(room)?,
                offer,
            },
            dto::ClientEvent::CallAccepted {
                room,
                caller_connection_id,
            } => RelayEvent::CallAccepted {
                room: RoomName::new(room)?,
                caller: ConnectionId::new(caller_connection_id)?,
            },
            dto::ClientEvent::CallEnded { room } => RelayEvent::CallEnded {
                room: RoomName::new(room)?,
            },
            dto::ClientEvent::WebrtcOffer {
                target_connection_id,
                payload,
            } => signal(SignalKind::Offer, target_connection_id, payload)?,
            dto::ClientEvent::WebrtcAnswer {
                target_connection_id,
                payload,
            } => signal(SignalKind::Answer, target_connection_id, payload)?,
            dto::ClientEvent::WebrtcIceCandidate {
                target_connection_id,
                payload,
            } => signal(SignalKind::IceCandidate, target_connection_id, payload)?,
        };
        Ok(relay_event)
    }
}

fn signal(
    kind: SignalKind,
    target: String,
    payload: serde_json::Value,
) -> Result<RelayEvent, ValueObjectError> {
    Ok(RelayEvent::Signal {
        kind,
        target: ConnectionId::new(target)?,
        payload,
    })
}

// ========================================
// Domain → DTO
// ========================================

impl From<PresenceRecord> for dto::PresenceDto {
    fn from(record: PresenceRecord) -> Self {
        Self {
            user_id: record.user_id.into_string(),
            display_name: record.display_name.into_string(),
            connection_id: record.connection_id.into_string(),
            is_available_for_call: record.is_available_for_call,
        }
    }
}

impl From<ChatMessage> for dto::ChatMessageDto {
    fn from(message: ChatMessage) -> Self {
        Self {
            text: message.text.into_string(),
            sender: message.sender,
            user_id: message.sender_user_id.into_string(),
            timestamp: Some(message.timestamp.value()),
        }
    }
}

impl From<CallEndReason> for dto::CallEndReasonDto {
    fn from(reason: CallEndReason) -> Self {
        match reason {
            CallEndReason::NoAvailablePeers => dto::CallEndReasonDto::NoAvailablePeers,
            CallEndReason::PartnerEnded => dto::CallEndReasonDto::PartnerEnded,
            CallEndReason::PartnerDisconnected => dto::CallEndReasonDto::PartnerDisconnected,
        }
    }
}

impl From<RelayNotice> for dto::ServerEvent {
    fn from(notice: RelayNotice) -> Self {
        match notice {
            RelayNotice::Connected { connection_id } => dto::ServerEvent::Connected {
                connection_id: connection_id.into_string(),
            },
            RelayNotice::RoomUsersUpdate { room, users } => dto::ServerEvent::RoomUsersUpdate {
                room: room.into_string(),
                users: users.into_iter().map(Into::into).collect(),
            },
            RelayNotice::ReceiveMessage(message) => dto::ServerEvent::ReceiveMessage {
                message: message.into(),
            },
            RelayNotice::CodeUpdate {
                file_id,
                content,
                sender,
            } => dto::ServerEvent::CodeUpdate {
                file_id,
                content,
                sender_connection_id: sender.into_string(),
            },
            RelayNotice::IncomingCall {
                caller,
                caller_display_name,
            } => dto::ServerEvent::IncomingCall {
                caller_connection_id: caller.into_string(),
                caller_display_name: caller_display_name.into_string(),
            },
            RelayNotice::Signal {
                kind,
                sender,
                payload,
            } => {
                let sender_connection_id = sender.into_string();
                match kind {
                    SignalKind::Offer => dto::ServerEvent::WebrtcOffer {
                        payload,
                        sender_connection_id,
                    },
                    SignalKind::Answer => dto::ServerEvent::WebrtcAnswer {
                        payload,
                        sender_connection_id,
                    },
                    SignalKind::IceCandidate => dto::ServerEvent::WebrtcIceCandidate {
                        payload,
                        sender_connection_id,
                    },
                }
            }
            RelayNotice::CallEstablished { remote } => dto::ServerEvent::CallEstablished {
                remote_connection_id: remote.into_string(),
            },
            RelayNotice::CallEnded { reason } => dto::ServerEvent::CallEnded {
                reason: reason.into(),
            },
            RelayNotice::CallRejectedBusy => dto::ServerEvent::CallEnded {
                reason: dto::CallEndReasonDto::Busy,
            },
            RelayNotice::CallEndedByDisconnect { disconnected } => {
                dto::ServerEvent::CallEndedByDisconnect {
                    disconnected_connection_id: disconnected.into_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_send_message_dto_to_domain() {
        // テスト項目: send-message の DTO がドメインイベントに変換される
        // given (前提条件):
        let event = dto::ClientEvent::SendMessage {
            room: "demo".to_string(),
            message: dto::ChatMessageDto {
                text: "hello".to_string(),
                sender: "Ann".to_string(),
                user_id: "u1".to_string(),
                timestamp: Some(1000),
            },
        };

        // when (操作):
        let relay_event = RelayEvent::try_from(event).unwrap();

        // then (期待する結果):
        assert_eq!(
            relay_event,
            RelayEvent::SendMessage {
                room: RoomName::new("demo".to_string()).unwrap(),
                text: MessageText::new("hello".to_string()).unwrap(),
                sender: "Ann".to_string(),
                sender_user_id: UserId::new("u1".to_string()).unwrap(),
                timestamp: Some(Timestamp::new(1000)),
            }
        );
    }

    #[test]
    fn test_display_time_string_becomes_unstamped_message() {
        // テスト項目: 時刻文字列付きのチャットは timestamp なしのドメインイベントになる
        // given (前提条件):
        let frame = r#"{"type":"send-message","room":"demo","message":{"text":"hello","sender":"Ann","userId":"u1","timestamp":"10:30:01 AM"}}"#;
        let event: dto::ClientEvent = serde_json::from_str(frame).unwrap();

        // when (操作):
        let relay_event = RelayEvent::try_from(event).unwrap();

        // then (期待する結果):
        assert!(matches!(
            relay_event,
            RelayEvent::SendMessage {
                timestamp: None,
                ..
            }
        ));
    }

    #[test]
    fn test_long_room_name_and_pasted_code_are_accepted() {
        // テスト項目: 長いルーム名と 8 KiB を超えるチャット本文もそのまま変換される
        // given (前提条件):
        let room = "r".repeat(300);
        let text = "x".repeat(9 * 1024);
        let join = dto::ClientEvent::JoinRoom {
            room: room.clone(),
            user_id: "u1".to_string(),
            display_name: "Ann".to_string(),
        };
        let chat = dto::ClientEvent::SendMessage {
            room: room.clone(),
            message: dto::ChatMessageDto {
                text: text.clone(),
                sender: "Ann".to_string(),
                user_id: "u1".to_string(),
                timestamp: None,
            },
        };

        // when (操作):
        let join = RelayEvent::try_from(join);
        let chat = RelayEvent::try_from(chat);

        // then (期待する結果):
        assert!(matches!(join, Ok(RelayEvent::JoinRoom { .. })));
        let Ok(RelayEvent::SendMessage { text: body, .. }) = chat else {
            panic!("expected send-message");
        };
        assert_eq!(body.as_str(), text);
    }

    #[test]
    fn test_empty_message_text_is_rejected() {
        // テスト項目: 空のチャット本文は変換エラーになる
        // given (前提条件):
        let event = dto::ClientEvent::SendMessage {
            room: "demo".to_string(),
            message: dto::ChatMessageDto {
                text: "   ".to_string(),
                sender: "Ann".to_string(),
                user_id: "u1".to_string(),
                timestamp: None,
            },
        };

        // when (操作):
        let result = RelayEvent::try_from(event);

        // then (期待する結果):
        assert!(matches!(result, Err(ValueObjectError::Empty(_))));
    }

    #[test]
    fn test_empty_signal_target_is_rejected() {
        // テスト項目: 宛先が空のシグナリングは変換エラーになる
        // given (前提条件):
        let event = dto::ClientEvent::WebrtcAnswer {
            target_connection_id: String::new(),
            payload: json!({"sdp": "v=0"}),
        };

        // when (操作):
        let result = RelayEvent::try_from(event);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_busy_rejection_maps_to_call_ended_busy() {
        // テスト項目: 通話中の発信拒否は call-ended {reason: busy} になる
        // when (操作):
        let event = dto::ServerEvent::from(RelayNotice::CallRejectedBusy);

        // then (期待する結果):
        assert_eq!(
            serde_json::to_value(event).unwrap(),
            json!({"type": "call-ended", "reason": "busy"})
        );
    }

    #[test]
    fn test_signal_notice_keeps_payload_and_sender() {
        // テスト項目: シグナリング通知はペイロードを変更せず送信者 ID を付けて出力される
        // given (前提条件):
        let payload = json!({"type": "offer", "sdp": "v=0\r\n"});
        let notice = RelayNotice::Signal {
            kind: SignalKind::Offer,
            sender: ConnectionId::new("c1".to_string()).unwrap(),
            payload: payload.clone(),
        };

        // when (操作):
        let value = serde_json::to_value(dto::ServerEvent::from(notice)).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            json!({"type": "webrtc-offer", "payload": payload, "senderConnectionId": "c1"})
        );
    }

    #[test]
    fn test_presence_update_serializes_camel_case() {
        // テスト項目: プレゼンス更新が camelCase のフィールドで出力される
        // given (前提条件):
        let record = PresenceRecord::new(
            UserId::new("u1".to_string()).unwrap(),
            DisplayName::new("Ann".to_string()).unwrap(),
            ConnectionId::new("c1".to_string()).unwrap(),
        );
        let notice = RelayNotice::RoomUsersUpdate {
            room: RoomName::new("demo".to_string()).unwrap(),
            users: vec![record],
        };

        // when (操作):
        let value = serde_json::to_value(dto::ServerEvent::from(notice)).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            json!({
                "type": "room-users-update",
                "room": "demo",
                "users": [{
                    "userId": "u1",
                    "displayName": "Ann",
                    "connectionId": "c1",
                    "isAvailableForCall": true
                }]
            })
        );
    }
}

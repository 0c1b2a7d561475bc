//! WebSocket frame DTOs.
//!
//! Every frame is a JSON object tagged by `type` (kebab-case) with camelCase
//! fields. Signaling payloads are carried as raw JSON and never inspected.

use serde::{Deserialize, Deserializer, Serialize};

/// Frame sent by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room: String,
        user_id: String,
        display_name: String,
    },
    LeaveRoom {
        room: String,
    },
    #[serde(rename_all = "camelCase")]
    CodeChange {
        room: String,
        file_id: String,
        content: String,
    },
    SendMessage {
        room: String,
        message: ChatMessageDto,
    },
    #[serde(rename_all = "camelCase")]
    CallRequest {
        room: String,
        /// Informational; the relay announces the name from the caller's presence
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caller_display_name: Option<String>,
        #[serde(default)]
        offer: serde_json::Value,
    },
    #[serde(rename_all = "camelCase")]
    CallAccepted {
        room: String,
        caller_connection_id: String,
    },
    CallEnded {
        room: String,
    },
    #[serde(rename_all = "camelCase")]
    WebrtcOffer {
        target_connection_id: String,
        payload: serde_json::Value,
    },
    #[serde(rename_all = "camelCase")]
    WebrtcAnswer {
        target_connection_id: String,
        payload: serde_json::Value,
    },
    #[serde(rename_all = "camelCase")]
    WebrtcIceCandidate {
        target_connection_id: String,
        payload: serde_json::Value,
    },
}

/// Frame sent by the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    Connected {
        connection_id: String,
    },
    RoomUsersUpdate {
        room: String,
        users: Vec<PresenceDto>,
    },
    ReceiveMessage {
        message: ChatMessageDto,
    },
    #[serde(rename_all = "camelCase")]
    CodeUpdate {
        file_id: String,
        content: String,
        sender_connection_id: String,
    },
    #[serde(rename_all = "camelCase")]
    IncomingCall {
        caller_connection_id: String,
        caller_display_name: String,
    },
    #[serde(rename_all = "camelCase")]
    WebrtcOffer {
        payload: serde_json::Value,
        sender_connection_id: String,
    },
    #[serde(rename_all = "camelCase")]
    WebrtcAnswer {
        payload: serde_json::Value,
        sender_connection_id: String,
    },
    #[serde(rename_all = "camelCase")]
    WebrtcIceCandidate {
        payload: serde_json::Value,
        sender_connection_id: String,
    },
    #[serde(rename_all = "camelCase")]
    CallEstablished {
        remote_connection_id: String,
    },
    CallEnded {
        reason: CallEndReasonDto,
    },
    #[serde(rename_all = "camelCase")]
    CallEndedByDisconnect {
        disconnected_connection_id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallEndReasonDto {
    NoAvailablePeers,
    Busy,
    PartnerEnded,
    PartnerDisconnected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceDto {
    pub user_id: String,
    pub display_name: String,
    pub connection_id: String,
    pub is_available_for_call: bool,
}

/// Chat message as carried on the wire.
///
/// `timestamp` is epoch milliseconds. Clients may omit it on send, or send
/// a display string such as `"10:30:01 AM"`; anything that is not a number
/// is read as absent and the relay stamps its own time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageDto {
    pub text: String,
    pub sender: String,
    pub user_id: String,
    #[serde(
        default,
        deserialize_with = "lenient_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<i64>,
}

fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_room_frame_parses() {
        // テスト項目: join-room フレームが camelCase のフィールドで解釈される
        // given (前提条件):
        let frame = r#"{"type":"join-room","room":"demo","userId":"u1","displayName":"Ann"}"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(frame).unwrap();

        // then (期待する結果):
        assert_eq!(
            event,
            ClientEvent::JoinRoom {
                room: "demo".to_string(),
                user_id: "u1".to_string(),
                display_name: "Ann".to_string(),
            }
        );
    }

    #[test]
    fn test_send_message_without_timestamp_parses() {
        // テスト項目: timestamp を省略したチャットメッセージも受け付ける
        // given (前提条件):
        let frame = json!({
            "type": "send-message",
            "room": "demo",
            "message": {"text": "hi", "sender": "Ann", "userId": "u1"}
        });

        // when (操作):
        let event: ClientEvent = serde_json::from_value(frame).unwrap();

        // then (期待する結果):
        let ClientEvent::SendMessage { message, .. } = event else {
            panic!("expected send-message");
        };
        assert_eq!(message.timestamp, None);
    }

    #[test]
    fn test_send_message_with_display_time_string_parses() {
        // テスト項目: 表示用の時刻文字列を持つチャットメッセージも受け付け、timestamp は未設定になる
        // given (前提条件):
        let frame = r#"{"type":"send-message","room":"demo","message":{"text":"hi","sender":"Ann","userId":"u1","timestamp":"10:30:01 AM"}}"#;

        // when (操作):
        let event: ClientEvent = serde_json::from_str(frame).unwrap();

        // then (期待する結果):
        let ClientEvent::SendMessage { message, .. } = event else {
            panic!("expected send-message");
        };
        assert_eq!(message.text, "hi");
        assert_eq!(message.timestamp, None);
    }

    #[test]
    fn test_send_message_timestamp_accepts_numbers_and_numeric_strings() {
        // テスト項目: 数値と数値文字列の timestamp はエポックミリ秒として読まれる
        // given (前提条件):
        let numeric = json!({"text": "a", "sender": "Ann", "userId": "u1", "timestamp": 1700000000000_i64});
        let as_string = json!({"text": "a", "sender": "Ann", "userId": "u1", "timestamp": "1700000000000"});
        let null = json!({"text": "a", "sender": "Ann", "userId": "u1", "timestamp": null});

        // when (操作):
        let numeric: ChatMessageDto = serde_json::from_value(numeric).unwrap();
        let as_string: ChatMessageDto = serde_json::from_value(as_string).unwrap();
        let null: ChatMessageDto = serde_json::from_value(null).unwrap();

        // then (期待する結果):
        assert_eq!(numeric.timestamp, Some(1_700_000_000_000));
        assert_eq!(as_string.timestamp, Some(1_700_000_000_000));
        assert_eq!(null.timestamp, None);
    }

    #[test]
    fn test_ice_candidate_tag_is_kebab_case() {
        // テスト項目: ICE candidate のタグ名が webrtc-ice-candidate になる
        // given (前提条件):
        let frame = json!({
            "type": "webrtc-ice-candidate",
            "targetConnectionId": "c2",
            "payload": {"candidate": "x"}
        });

        // when (操作):
        let event: ClientEvent = serde_json::from_value(frame).unwrap();

        // then (期待する結果):
        assert!(matches!(event, ClientEvent::WebrtcIceCandidate { .. }));
    }

    #[test]
    fn test_call_request_offer_defaults_to_null() {
        // テスト項目: call-request の offer は省略時 null になる
        // when (操作):
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"call-request","room":"demo"}"#).unwrap();

        // then (期待する結果):
        assert_eq!(
            event,
            ClientEvent::CallRequest {
                room: "demo".to_string(),
                caller_display_name: None,
                offer: serde_json::Value::Null,
            }
        );
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        // テスト項目: 未知の type はパースエラーになる
        // when (操作):
        let result = serde_json::from_str::<ClientEvent>(r#"{"type":"dance","room":"demo"}"#);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_call_ended_reason_serializes_kebab_case() {
        // テスト項目: 通話終了理由が kebab-case で出力される
        // given (前提条件):
        let event = ServerEvent::CallEnded {
            reason: CallEndReasonDto::NoAvailablePeers,
        };

        // when (操作):
        let value = serde_json::to_value(&event).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            json!({"type": "call-ended", "reason": "no-available-peers"})
        );
    }
}

//! Value objects of the relay domain.
//!
//! Identifiers arriving from the wire are checked for blank values here,
//! at the boundary; length is not limited.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

fn validate_identifier(kind: &'static str, value: &str) -> Result<(), ValueObjectError> {
    if value.trim().is_empty() {
        return Err(ValueObjectError::Empty(kind));
    }
    Ok(())
}

macro_rules! string_value_object {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: String) -> Result<Self, ValueObjectError> {
                validate_identifier($kind, &value)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_value_object!(
    /// Ephemeral identifier of one live WebSocket connection.
    ConnectionId,
    "connection id"
);

string_value_object!(
    /// Caller-supplied room name. Opaque; collisions are not checked.
    RoomName,
    "room name"
);

string_value_object!(
    /// Caller-supplied user identifier (not verified by the relay).
    UserId,
    "user id"
);

string_value_object!(
    /// Human-readable name shown in presence lists and chat.
    DisplayName,
    "display name"
);

/// Text body of a chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MessageText(String);

impl MessageText {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::Empty("message text"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageText {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MessageText> for String {
    fn from(value: MessageText) -> Self {
        value.0
    }
}

/// Generates fresh connection identifiers
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    pub fn generate() -> ConnectionId {
        ConnectionId(Uuid::new_v4().simple().to_string())
    }
}

/// Unix timestamp in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// Milliseconds elapsed from `self` to `later`, zero if `later` is earlier
    pub fn elapsed_until(&self, later: Timestamp) -> i64 {
        (later.0 - self.0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_name_accepts_non_empty_value() {
        // テスト項目: 空でないルーム名は受け入れられる
        // given (前提条件):
        let value = "demo".to_string();

        // when (操作):
        let result = RoomName::new(value);

        // then (期待する結果):
        assert_eq!(result.unwrap().as_str(), "demo");
    }

    #[test]
    fn test_room_name_rejects_whitespace_only_value() {
        // テスト項目: 空白のみのルーム名は拒否される
        // given (前提条件):
        let value = "   \t".to_string();

        // when (操作):
        let result = RoomName::new(value);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::Empty("room name")));
    }

    #[test]
    fn test_room_name_has_no_length_limit() {
        // テスト項目: 長いルーム名も不透明な文字列としてそのまま受け付ける
        // given (前提条件):
        let value = "r".repeat(300);

        // when (操作):
        let result = RoomName::new(value.clone());

        // then (期待する結果):
        assert_eq!(result.unwrap().as_str(), value);
    }

    #[test]
    fn test_message_text_allows_pasted_code_but_not_empty() {
        // テスト項目: 貼り付けたコードほど長い本文も受け付け、空は拒否される
        // given (前提条件):
        let long = "fn main() {}\n".repeat(1024);

        // when (操作):
        let long_result = MessageText::new(long);
        let empty_result = MessageText::new(" ".to_string());

        // then (期待する結果):
        assert!(long_result.is_ok());
        assert_eq!(empty_result, Err(ValueObjectError::Empty("message text")));
    }

    #[test]
    fn test_user_id_deserialization_validates() {
        // テスト項目: デシリアライズ時にもバリデーションが行われる
        // given (前提条件):
        let valid = r#""user-1""#;
        let invalid = r#""""#;

        // when (操作):
        let valid_result = serde_json::from_str::<UserId>(valid);
        let invalid_result = serde_json::from_str::<UserId>(invalid);

        // then (期待する結果):
        assert_eq!(valid_result.unwrap().as_str(), "user-1");
        assert!(invalid_result.is_err());
    }

    #[test]
    fn test_connection_id_factory_generates_unique_ids() {
        // テスト項目: ConnectionIdFactory は毎回異なる ID を生成する
        // when (操作):
        let first = ConnectionIdFactory::generate();
        let second = ConnectionIdFactory::generate();

        // then (期待する結果):
        assert_ne!(first, second);
        assert_eq!(first.as_str().len(), 32);
    }

    #[test]
    fn test_timestamp_elapsed_until_never_negative() {
        // テスト項目: 経過時間は負にならない
        // given (前提条件):
        let earlier = Timestamp::new(1_000);
        let later = Timestamp::new(4_000);

        // when (操作):
        let forward = earlier.elapsed_until(later);
        let backward = later.elapsed_until(earlier);

        // then (期待する結果):
        assert_eq!(forward, 3_000);
        assert_eq!(backward, 0);
    }
}

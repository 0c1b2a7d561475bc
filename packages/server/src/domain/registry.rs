//! Connection Registry: live connections and the room each one is in.

use std::collections::HashMap;

use super::value_object::{ConnectionId, RoomName, Timestamp};

#[derive(Debug, Clone)]
struct ConnectionEntry {
    connected_at: Timestamp,
    room: Option<RoomName>,
}

/// Tracks each live connection's identity and current room.
///
/// Uniqueness of connection ids is guaranteed by the transport layer, so
/// registering an id twice simply resets its entry.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionEntry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, connection_id: ConnectionId, connected_at: Timestamp) {
        self.connections.insert(
            connection_id,
            ConnectionEntry {
                connected_at,
                room: None,
            },
        );
    }

    /// Forget the connection, returning the room it was in for cascade cleanup
    pub fn unregister(&mut self, connection_id: &ConnectionId) -> Option<RoomName> {
        self.connections
            .remove(connection_id)
            .and_then(|entry| entry.room)
    }

    /// Record the room the connection is now in, returning the previous one.
    /// Unknown connections are ignored.
    pub fn set_room(
        &mut self,
        connection_id: &ConnectionId,
        room: Option<RoomName>,
    ) -> Option<RoomName> {
        self.connections
            .get_mut(connection_id)
            .and_then(|entry| std::mem::replace(&mut entry.room, room))
    }

    pub fn room_of(&self, connection_id: &ConnectionId) -> Option<&RoomName> {
        self.connections
            .get(connection_id)
            .and_then(|entry| entry.room.as_ref())
    }

    pub fn connected_at(&self, connection_id: &ConnectionId) -> Option<Timestamp> {
        self.connections
            .get(connection_id)
            .map(|entry| entry.connected_at)
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.connections.contains_key(connection_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    fn room(name: &str) -> RoomName {
        RoomName::new(name.to_string()).unwrap()
    }

    #[test]
    fn test_unregister_returns_room_for_cascade() {
        // テスト項目: 登録解除時に所属ルームが返される
        // given (前提条件):
        let mut registry = ConnectionRegistry::new();
        registry.register(conn("c1"), Timestamp::new(1));
        registry.set_room(&conn("c1"), Some(room("demo")));

        // when (操作):
        let result = registry.unregister(&conn("c1"));

        // then (期待する結果):
        assert_eq!(result, Some(room("demo")));
        assert!(!registry.contains(&conn("c1")));
    }

    #[test]
    fn test_unregister_without_room_returns_none() {
        // テスト項目: ルーム未参加の接続を解除すると None が返される
        // given (前提条件):
        let mut registry = ConnectionRegistry::new();
        registry.register(conn("c1"), Timestamp::new(1));

        // when (操作):
        let result = registry.unregister(&conn("c1"));

        // then (期待する結果):
        assert_eq!(result, None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_unknown_connection_is_noop() {
        // テスト項目: 未登録の接続の解除はエラーにならない
        // given (前提条件):
        let mut registry = ConnectionRegistry::new();

        // when (操作):
        let result = registry.unregister(&conn("ghost"));

        // then (期待する結果):
        assert_eq!(result, None);
    }

    #[test]
    fn test_set_room_returns_previous_room() {
        // テスト項目: ルーム変更時に以前のルームが返される
        // given (前提条件):
        let mut registry = ConnectionRegistry::new();
        registry.register(conn("c1"), Timestamp::new(1));
        registry.set_room(&conn("c1"), Some(room("a")));

        // when (操作):
        let previous = registry.set_room(&conn("c1"), Some(room("b")));

        // then (期待する結果):
        assert_eq!(previous, Some(room("a")));
        assert_eq!(registry.room_of(&conn("c1")), Some(&room("b")));
    }

    #[test]
    fn test_set_room_on_unknown_connection_is_ignored() {
        // テスト項目: 未登録の接続にルームを設定しても登録されない
        // given (前提条件):
        let mut registry = ConnectionRegistry::new();

        // when (操作):
        let previous = registry.set_room(&conn("ghost"), Some(room("a")));

        // then (期待する結果):
        assert_eq!(previous, None);
        assert_eq!(registry.room_of(&conn("ghost")), None);
        assert_eq!(registry.len(), 0);
    }
}

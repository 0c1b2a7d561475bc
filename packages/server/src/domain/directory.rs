//! Room Directory: rooms, their members' presence and their chat history.

use std::collections::HashMap;

use super::{
    chat_history::ChatHistory,
    entity::{ChatMessage, PresenceRecord},
    value_object::{ConnectionId, DisplayName, RoomName, Timestamp, UserId},
};

/// A named collaboration session
#[derive(Debug, Clone)]
pub struct Room {
    name: RoomName,
    /// Presence records in join order
    members: Vec<PresenceRecord>,
    history: ChatHistory,
    created_at: Timestamp,
    /// When the last member left; `None` while the room has members
    vacated_at: Option<Timestamp>,
}

impl Room {
    fn new(name: RoomName, created_at: Timestamp, history_capacity: Option<usize>) -> Self {
        Self {
            name,
            members: Vec::new(),
            history: ChatHistory::with_capacity(history_capacity),
            created_at,
            vacated_at: Some(created_at),
        }
    }

    pub fn name(&self) -> &RoomName {
        &self.name
    }

    pub fn members(&self) -> &[PresenceRecord] {
        &self.members
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn vacated_at(&self) -> Option<Timestamp> {
        self.vacated_at
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn position_of(&self, connection_id: &ConnectionId) -> Option<usize> {
        self.members
            .iter()
            .position(|m| &m.connection_id == connection_id)
    }
}

/// Maps room names to their members and chat history.
///
/// Rooms are created lazily on first join. An emptied room keeps its history
/// until [`RoomDirectory::evict_idle`] removes it.
#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: HashMap<RoomName, Room>,
    history_capacity: Option<usize>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory whose rooms keep at most `history_capacity` chat messages
    pub fn with_history_capacity(history_capacity: Option<usize>) -> Self {
        Self {
            rooms: HashMap::new(),
            history_capacity,
        }
    }

    /// Insert or overwrite the presence record of `connection_id` in `room`.
    ///
    /// A new record is available for calls. Overwriting keeps the member's
    /// position in join order. Returns the full member list.
    pub fn join(
        &mut self,
        room: &RoomName,
        connection_id: ConnectionId,
        user_id: UserId,
        display_name: DisplayName,
        now: Timestamp,
    ) -> Vec<PresenceRecord> {
        let history_capacity = self.history_capacity;
        let entry = self
            .rooms
            .entry(room.clone())
            .or_insert_with(|| Room::new(room.clone(), now, history_capacity));

        let record = PresenceRecord::new(user_id, display_name, connection_id);
        match entry.position_of(&record.connection_id) {
            Some(index) => entry.members[index] = record,
            None => entry.members.push(record),
        }
        entry.vacated_at = None;

        entry.members.clone()
    }

    /// Remove `connection_id` from `room`.
    ///
    /// Returns the updated member list, or `None` if the room or the member
    /// is absent. Repeated leaves are no-ops.
    pub fn leave(
        &mut self,
        room: &RoomName,
        connection_id: &ConnectionId,
        now: Timestamp,
    ) -> Option<Vec<PresenceRecord>> {
        let entry = self.rooms.get_mut(room)?;
        let index = entry.position_of(connection_id)?;
        entry.members.remove(index);
        if entry.members.is_empty() {
            entry.vacated_at = Some(now);
        }
        Some(entry.members.clone())
    }

    /// Set the call availability flag of a current member.
    ///
    /// Returns `true` if a record was found. Stale ids (after a disconnect or
    /// a race) are ignored.
    pub fn set_availability(
        &mut self,
        room: &RoomName,
        connection_id: &ConnectionId,
        available: bool,
    ) -> bool {
        let Some(entry) = self.rooms.get_mut(room) else {
            return false;
        };
        match entry.position_of(connection_id) {
            Some(index) => {
                entry.members[index].is_available_for_call = available;
                true
            }
            None => false,
        }
    }

    /// Members of `room` in join order; empty if the room does not exist
    pub fn list_members(&self, room: &RoomName) -> Vec<PresenceRecord> {
        self.rooms
            .get(room)
            .map(|r| r.members.clone())
            .unwrap_or_default()
    }

    pub fn member(&self, room: &RoomName, connection_id: &ConnectionId) -> Option<&PresenceRecord> {
        let entry = self.rooms.get(room)?;
        entry.position_of(connection_id).map(|i| &entry.members[i])
    }

    /// Append a message to the room's history. Returns `false` if the room does not exist.
    pub fn append_message(&mut self, room: &RoomName, message: ChatMessage) -> bool {
        match self.rooms.get_mut(room) {
            Some(entry) => {
                entry.history.append(message);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the room's chat history in arrival order
    pub fn replay(&self, room: &RoomName) -> std::vec::IntoIter<ChatMessage> {
        self.rooms
            .get(room)
            .map(|r| r.history.replay())
            .unwrap_or_default()
    }

    /// Remove rooms that have been empty for at least `idle_ttl_millis`.
    ///
    /// Returns the names of the evicted rooms.
    pub fn evict_idle(&mut self, now: Timestamp, idle_ttl_millis: i64) -> Vec<RoomName> {
        let expired: Vec<RoomName> = self
            .rooms
            .values()
            .filter(|room| {
                room.is_empty()
                    && room
                        .vacated_at
                        .is_some_and(|at| at.elapsed_until(now) >= idle_ttl_millis)
            })
            .map(|room| room.name.clone())
            .collect();

        for name in &expired {
            self.rooms.remove(name);
        }
        expired
    }

    pub fn get(&self, room: &RoomName) -> Option<&Room> {
        self.rooms.get(room)
    }

    /// All rooms sorted by name
    pub fn rooms(&self) -> Vec<&Room> {
        let mut rooms: Vec<&Room> = self.rooms.values().collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        rooms
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

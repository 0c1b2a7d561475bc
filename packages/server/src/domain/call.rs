//! Call Coordinator: pairwise call sessions layered on the Room Directory.
//!
//! Caller side moves `Idle -> Calling -> Connected -> Idle`, callee side
//! `Idle -> Receiving -> Connected -> Idle`. A session is stored once per
//! party, so "who is my partner" is a single lookup from either side. Both
//! parties are unavailable for other calls while the session exists.

use std::collections::HashMap;

use super::{
    directory::RoomDirectory,
    entity::{CallState, PresenceRecord},
    error::CallError,
    value_object::{ConnectionId, RoomName, Timestamp},
};

/// Result of accepting a call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// The pair is now connected; both sides are told
    Established,
    /// The pair was already connected; nothing to do
    AlreadyConnected,
    /// One side is in a session with someone else, or not a member of the room
    Conflict,
}

/// Result of a disconnect cascade
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisconnectOutcome {
    /// Call partner that was left behind, now available again
    pub partner: Option<ConnectionId>,
    /// Members remaining in the room, `None` if the connection was not a member
    pub remaining_members: Option<Vec<PresenceRecord>>,
}

#[derive(Debug, Default)]
pub struct CallCoordinator {
    /// Non-idle connections only
    states: HashMap<ConnectionId, CallState>,
}

impl CallCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state_of(&self, connection_id: &ConnectionId) -> CallState {
        self.states
            .get(connection_id)
            .cloned()
            .unwrap_or(CallState::Idle)
    }

    pub fn partner_of(&self, connection_id: &ConnectionId) -> Option<&ConnectionId> {
        self.states.get(connection_id).and_then(CallState::peer)
    }

    /// Number of sessions (pending or connected)
    pub fn session_count(&self) -> usize {
        self.states.len() / 2
    }

    /// Number of connected calls in `room`; pending requests are not counted
    pub fn sessions_in(&self, directory: &RoomDirectory, room: &RoomName) -> usize {
        directory
            .list_members(room)
            .iter()
            .filter(|m| {
                matches!(
                    self.states.get(&m.connection_id),
                    Some(CallState::Connected { .. })
                )
            })
            .count()
            / 2
    }

    /// Pick the first available member of `room` (join order) other than the
    /// caller, pair them and mark both unavailable.
    ///
    /// On rejection nothing changes.
    pub fn request_call(
        &mut self,
        directory: &mut RoomDirectory,
        room: &RoomName,
        caller: &ConnectionId,
    ) -> Result<PresenceRecord, CallError> {
        if !self.state_of(caller).is_idle() {
            return Err(CallError::Busy);
        }
        if directory.member(room, caller).is_none() {
            return Err(CallError::NotAMember);
        }

        let target = directory
            .list_members(room)
            .into_iter()
            .find(|m| m.is_available_for_call && &m.connection_id != caller)
            .ok_or(CallError::NoPeersAvailable)?;

        directory.set_availability(room, caller, false);
        directory.set_availability(room, &target.connection_id, false);
        self.states.insert(
            caller.clone(),
            CallState::Calling {
                peer: target.connection_id.clone(),
            },
        );
        self.states.insert(
            target.connection_id.clone(),
            CallState::Receiving {
                peer: caller.clone(),
            },
        );

        Ok(target)
    }

    /// Confirm the session between `callee` and `caller`.
    ///
    /// A pending request is promoted to `Connected`. Two idle members of the
    /// room (peers that negotiated directly) get a new session. Accepting an
    /// already connected pair is a no-op.
    pub fn accept_call(
        &mut self,
        directory: &mut RoomDirectory,
        room: &RoomName,
        callee: &ConnectionId,
        caller: &ConnectionId,
    ) -> AcceptOutcome {
        if callee == caller
            || directory.member(room, callee).is_none()
            || directory.member(room, caller).is_none()
        {
            return AcceptOutcome::Conflict;
        }

        match (self.state_of(callee), self.state_of(caller)) {
            (CallState::Connected { peer: a }, CallState::Connected { peer: b })
                if &a == caller && &b == callee =>
            {
                return AcceptOutcome::AlreadyConnected;
            }
            (CallState::Receiving { peer: a }, CallState::Calling { peer: b })
                if &a == caller && &b == callee => {}
            (CallState::Idle, CallState::Idle) => {}
            _ => return AcceptOutcome::Conflict,
        }

        directory.set_availability(room, caller, false);
        directory.set_availability(room, callee, false);
        self.states.insert(
            caller.clone(),
            CallState::Connected {
                peer: callee.clone(),
            },
        );
        self.states.insert(
            callee.clone(),
            CallState::Connected {
                peer: caller.clone(),
            },
        );
        AcceptOutcome::Established
    }

    /// End the session `connection_id` is party to.
    ///
    /// Both parties become available again and the partner is returned so it
    /// can be notified. Without a session this is a silent no-op.
    pub fn end_call(
        &mut self,
        directory: &mut RoomDirectory,
        room: &RoomName,
        connection_id: &ConnectionId,
    ) -> Option<ConnectionId> {
        let partner = self.states.remove(connection_id)?.peer().cloned()?;
        self.states.remove(&partner);

        directory.set_availability(room, connection_id, true);
        directory.set_availability(room, &partner, true);

        Some(partner)
    }

    /// Same cleanup as [`CallCoordinator::end_call`], then removal of the
    /// connection from the room.
    pub fn on_disconnect(
        &mut self,
        directory: &mut RoomDirectory,
        room: &RoomName,
        connection_id: &ConnectionId,
        now: Timestamp,
    ) -> DisconnectOutcome {
        let partner = self.end_call(directory, room, connection_id);
        let remaining_members = directory.leave(room, connection_id, now);
        DisconnectOutcome {
            partner,
            remaining_members,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{DisplayName, UserId};

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    fn room() -> RoomName {
        RoomName::new("demo".to_string()).unwrap()
    }

    fn directory_with(ids: &[&str]) -> RoomDirectory {
        let mut directory = RoomDirectory::new();
        for id in ids {
            directory.join(
                &room(),
                conn(id),
                UserId::new(format!("user-{id}")).unwrap(),
                DisplayName::new(format!("name-{id}")).unwrap(),
                Timestamp::new(0),
            );
        }
        directory
    }

    fn available(directory: &RoomDirectory, id: &str) -> bool {
        directory
            .member(&room(), &conn(id))
            .map(|m| m.is_available_for_call)
            .unwrap()
    }

    #[test]
    fn test_request_call_picks_first_available_peer_in_join_order() {
        // テスト項目: 参加順で最初の通話可能なピアが選ばれる
        // given (前提条件):
        let mut directory = directory_with(&["a", "b", "c", "d"]);
        let mut calls = CallCoordinator::new();
        directory.set_availability(&room(), &conn("b"), false);

        // when (操作):
        let target = calls.request_call(&mut directory, &room(), &conn("d"));

        // then (期待する結果): b は不可なので a が選ばれる
        assert_eq!(target.unwrap().connection_id, conn("a"));
        assert!(!available(&directory, "a"));
        assert!(!available(&directory, "d"));
        assert!(available(&directory, "c"));
        assert_eq!(
            calls.state_of(&conn("d")),
            CallState::Calling { peer: conn("a") }
        );
        assert_eq!(
            calls.state_of(&conn("a")),
            CallState::Receiving { peer: conn("d") }
        );
    }

    #[test]
    fn test_request_call_without_peers_changes_nothing() {
        // テスト項目: 通話可能なピアがいない場合、状態も可用性も変わらない
        // given (前提条件):
        let mut directory = directory_with(&["a", "b"]);
        let mut calls = CallCoordinator::new();
        directory.set_availability(&room(), &conn("b"), false);

        // when (操作):
        let result = calls.request_call(&mut directory, &room(), &conn("a"));

        // then (期待する結果):
        assert_eq!(result, Err(CallError::NoPeersAvailable));
        assert!(available(&directory, "a"));
        assert!(!available(&directory, "b"));
        assert!(calls.state_of(&conn("a")).is_idle());
    }

    #[test]
    fn test_request_call_while_calling_is_busy() {
        // テスト項目: 発信中に再度発信すると Busy で拒否され、既存セッションは維持される
        // given (前提条件):
        let mut directory = directory_with(&["a", "b", "c"]);
        let mut calls = CallCoordinator::new();
        calls.request_call(&mut directory, &room(), &conn("a")).unwrap();

        // when (操作):
        let result = calls.request_call(&mut directory, &room(), &conn("a"));

        // then (期待する結果):
        assert_eq!(result, Err(CallError::Busy));
        assert_eq!(calls.partner_of(&conn("a")), Some(&conn("b")));
        assert!(available(&directory, "c"));
    }

    #[test]
    fn test_request_call_from_non_member_is_rejected() {
        // テスト項目: ルームのメンバーでない接続からの発信は拒否される
        // given (前提条件):
        let mut directory = directory_with(&["a"]);
        let mut calls = CallCoordinator::new();

        // when (操作):
        let result = calls.request_call(&mut directory, &room(), &conn("ghost"));

        // then (期待する結果):
        assert_eq!(result, Err(CallError::NotAMember));
        assert_eq!(calls.session_count(), 0);
    }

    #[test]
    fn test_accept_call_connects_pending_pair_once() {
        // テスト項目: 着信を受けると接続状態になり、二度目の受諾は何もしない
        // given (前提条件):
        let mut directory = directory_with(&["a", "b"]);
        let mut calls = CallCoordinator::new();
        calls.request_call(&mut directory, &room(), &conn("a")).unwrap();

        // when (操作):
        let first = calls.accept_call(&mut directory, &room(), &conn("b"), &conn("a"));
        let second = calls.accept_call(&mut directory, &room(), &conn("b"), &conn("a"));

        // then (期待する結果):
        assert_eq!(first, AcceptOutcome::Established);
        assert_eq!(second, AcceptOutcome::AlreadyConnected);
        assert_eq!(
            calls.state_of(&conn("a")),
            CallState::Connected { peer: conn("b") }
        );
        assert_eq!(calls.session_count(), 1);
    }

    #[test]
    fn test_accept_call_from_third_party_conflicts() {
        // テスト項目: 別セッション中の接続による受諾は衝突として無視される
        // given (前提条件):
        let mut directory = directory_with(&["a", "b", "c"]);
        let mut calls = CallCoordinator::new();
        calls.request_call(&mut directory, &room(), &conn("a")).unwrap();

        // when (操作): c が a の通話を受諾しようとする
        let result = calls.accept_call(&mut directory, &room(), &conn("c"), &conn("a"));

        // then (期待する結果):
        assert_eq!(result, AcceptOutcome::Conflict);
        assert_eq!(calls.partner_of(&conn("a")), Some(&conn("b")));
        assert!(calls.state_of(&conn("c")).is_idle());
    }

    #[test]
    fn test_end_call_is_idempotent_and_restores_availability() {
        // テスト項目: 通話終了は冪等で、両者の可用性が戻る
        // given (前提条件):
        let mut directory = directory_with(&["a", "b"]);
        let mut calls = CallCoordinator::new();
        calls.request_call(&mut directory, &room(), &conn("a")).unwrap();
        calls.accept_call(&mut directory, &room(), &conn("b"), &conn("a"));

        // when (操作):
        let first = calls.end_call(&mut directory, &room(), &conn("b"));
        let second = calls.end_call(&mut directory, &room(), &conn("b"));

        // then (期待する結果):
        assert_eq!(first, Some(conn("a")));
        assert_eq!(second, None);
        assert!(available(&directory, "a"));
        assert!(available(&directory, "b"));
        assert!(calls.state_of(&conn("a")).is_idle());
        assert!(calls.state_of(&conn("b")).is_idle());
    }

    #[test]
    fn test_on_disconnect_frees_partner_and_leaves_room() {
        // テスト項目: 通話中の切断でパートナーが解放され、切断者はルームから削除される
        // given (前提条件):
        let mut directory = directory_with(&["a", "b"]);
        let mut calls = CallCoordinator::new();
        calls.request_call(&mut directory, &room(), &conn("a")).unwrap();

        // when (操作):
        let outcome = calls.on_disconnect(&mut directory, &room(), &conn("b"), Timestamp::new(9));

        // then (期待する結果):
        assert_eq!(outcome.partner, Some(conn("a")));
        let remaining = outcome.remaining_members.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining[0].is_available_for_call);
        assert!(calls.state_of(&conn("a")).is_idle());
    }

    #[test]
    fn test_sessions_in_counts_only_connected_pairs() {
        // テスト項目: ルーム内の通話数には応答待ちの呼び出しが含まれない
        // given (前提条件):
        let mut directory = directory_with(&["a", "b", "c", "d"]);
        let mut calls = CallCoordinator::new();
        calls.request_call(&mut directory, &room(), &conn("a")).unwrap();
        calls.request_call(&mut directory, &room(), &conn("c")).unwrap();
        let pending = calls.sessions_in(&directory, &room());

        // when (操作):
        calls.accept_call(&mut directory, &room(), &conn("b"), &conn("a"));
        let count = calls.sessions_in(&directory, &room());

        // then (期待する結果):
        assert_eq!(pending, 0);
        assert_eq!(count, 1);
        assert_eq!(calls.session_count(), 2);
    }
}

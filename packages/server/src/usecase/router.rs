//! Message Router: the single dispatch point of the relay.
//!
//! Every inbound event is resolved against the Connection Registry, applied to
//! the Room Directory / Call Coordinator, and turned into a list of
//! [`Delivery`] values. The router never sends anything itself; the broker
//! hands the deliveries to the message pusher in the order returned, which is
//! what makes per-room delivery order equal dispatch order.
//!
//! ## Fan-out
//!
//! | event                 | fan-out                                              |
//! |-----------------------|------------------------------------------------------|
//! | join-room             | history replay to sender, presence to room           |
//! | code-change           | room excluding sender                                |
//! | send-message          | room including sender                                |
//! | call-*                | caller / callee / partner, presence to room          |
//! | webrtc-*              | unicast to the named target                          |
//! | disconnect            | partner, presence + disconnect notice to room        |

use std::sync::Arc;

use kyodo_shared::time::Clock;

use crate::domain::{
    AcceptOutcome, CallCoordinator, CallEndReason, CallError, ChatMessage, ConnectionId,
    ConnectionRegistry, Delivery, DisplayName, PresenceRecord, RelayEvent, RelayNotice,
    RoomDirectory, RoomName, SignalKind, SignalPayload, Timestamp, UserId,
};

/// Point-in-time view of one room, for the HTTP API
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub name: RoomName,
    pub members: Vec<PresenceRecord>,
    pub message_count: usize,
    pub active_calls: usize,
    pub created_at: Timestamp,
}

/// Owns all relay state and maps inbound events to outbound deliveries
pub struct MessageRouter {
    registry: ConnectionRegistry,
    directory: RoomDirectory,
    calls: CallCoordinator,
    clock: Arc<dyn Clock>,
}

impl MessageRouter {
    /// Create a router with empty state.
    ///
    /// # Arguments
    ///
    /// * `history_capacity` - Maximum chat messages kept per room (`None` = unbounded)
    /// * `clock` - Time source for join, leave and message timestamps
    pub fn new(history_capacity: Option<usize>, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            directory: RoomDirectory::with_history_capacity(history_capacity),
            calls: CallCoordinator::new(),
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// Register a new connection and tell it its own id
    pub fn connect(&mut self, connection_id: ConnectionId) -> Vec<Delivery> {
        let now = self.now();
        self.registry.register(connection_id.clone(), now);
        tracing::info!("Connection '{}' registered", connection_id);

        vec![Delivery::unicast(
            connection_id.clone(),
            RelayNotice::Connected { connection_id },
        )]
    }

    /// Route one event from `sender`
    pub fn dispatch(&mut self, sender: &ConnectionId, event: RelayEvent) -> Vec<Delivery> {
        if !self.registry.contains(sender) {
            tracing::warn!(
                "Dropping '{}' from unregistered connection '{}'",
                event.name(),
                sender
            );
            return Vec::new();
        }
        tracing::debug!("Dispatching '{}' from '{}'", event.name(), sender);

        match event {
            RelayEvent::JoinRoom {
                room,
                user_id,
                display_name,
            } => self.join(sender, room, user_id, display_name),
            RelayEvent::LeaveRoom { room } => match self.current_room(sender, &room, "leave-room") {
                Some(room) => self.leave(sender, &room),
                None => Vec::new(),
            },
            RelayEvent::CodeChange {
                room,
                file_id,
                content,
            } => match self.current_room(sender, &room, "code-change") {
                Some(room) => self.code_change(sender, &room, file_id, content),
                None => Vec::new(),
            },
            RelayEvent::SendMessage {
                room,
                text,
                sender: sender_name,
                sender_user_id,
                timestamp,
            } => match self.current_room(sender, &room, "send-message") {
                Some(room) => {
                    let timestamp = timestamp.unwrap_or_else(|| self.now());
                    let message = ChatMessage::new(text, sender_name, sender_user_id, timestamp);
                    self.send_message(&room, message)
                }
                None => Vec::new(),
            },
            RelayEvent::CallRequest { room, offer } => {
                match self.current_room(sender, &room, "call-request") {
                    Some(room) => self.request_call(sender, &room, offer),
                    None => Vec::new(),
                }
            }
            RelayEvent::CallAccepted { room, caller } => {
                match self.current_room(sender, &room, "call-accepted") {
                    Some(room) => self.accept_call(sender, &room, caller),
                    None => Vec::new(),
                }
            }
            RelayEvent::CallEnded { room } => match self.current_room(sender, &room, "call-ended") {
                Some(room) => self.end_call(sender, &room),
                None => Vec::new(),
            },
            RelayEvent::Signal {
                kind,
                target,
                payload,
            } => self.relay_signal(sender, kind, target, payload),
        }
    }

    /// Transport-level disconnect: unregister, end any call, leave the room
    pub fn disconnect(&mut self, connection_id: &ConnectionId) -> Vec<Delivery> {
        let Some(room) = self.registry.unregister(connection_id) else {
            tracing::info!("Connection '{}' closed outside any room", connection_id);
            return Vec::new();
        };

        let now = self.now();
        let outcome = self
            .calls
            .on_disconnect(&mut self.directory, &room, connection_id, now);

        let mut deliveries = Vec::new();
        if let Some(partner) = outcome.partner {
            tracing::info!(
                "Call between '{}' and '{}' ended by disconnect",
                connection_id,
                partner
            );
            deliveries.push(Delivery::unicast(
                partner,
                RelayNotice::CallEnded {
                    reason: CallEndReason::PartnerDisconnected,
                },
            ));
        }
        if let Some(members) = outcome.remaining_members {
            deliveries.push(presence(&room, members.clone()));
            deliveries.push(Delivery::to_members(
                &members,
                RelayNotice::CallEndedByDisconnect {
                    disconnected: connection_id.clone(),
                },
            ));
        }
        tracing::info!("Connection '{}' left room '{}' (disconnect)", connection_id, room);
        deliveries
    }

    /// Remove rooms that have had no members for `idle_ttl_millis`
    pub fn evict_idle(&mut self, idle_ttl_millis: i64) -> Vec<RoomName> {
        let now = self.now();
        let evicted = self.directory.evict_idle(now, idle_ttl_millis);
        for room in &evicted {
            tracing::info!("Evicted idle room '{}'", room);
        }
        evicted
    }

    pub fn room_snapshots(&self) -> Vec<RoomSnapshot> {
        self.directory
            .rooms()
            .into_iter()
            .filter_map(|room| self.snapshot_of(room.name()))
            .collect()
    }

    pub fn room_snapshot(&self, room: &RoomName) -> Option<RoomSnapshot> {
        self.snapshot_of(room)
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    fn snapshot_of(&self, name: &RoomName) -> Option<RoomSnapshot> {
        let room = self.directory.get(name)?;
        Some(RoomSnapshot {
            name: room.name().clone(),
            members: room.members().to_vec(),
            message_count: room.history().len(),
            active_calls: self.calls.sessions_in(&self.directory, name),
            created_at: room.created_at(),
        })
    }

    /// The sender's current room, if it matches the room named in the event
    fn current_room(
        &self,
        sender: &ConnectionId,
        claimed: &RoomName,
        event_name: &str,
    ) -> Option<RoomName> {
        match self.registry.room_of(sender) {
            Some(room) if room == claimed => Some(room.clone()),
            Some(room) => {
                tracing::warn!(
                    "Dropping '{}' from '{}': claims room '{}' but is in '{}'",
                    event_name,
                    sender,
                    claimed,
                    room
                );
                None
            }
            None => {
                tracing::warn!(
                    "Dropping '{}' from '{}': not in any room",
                    event_name,
                    sender
                );
                None
            }
        }
    }

    fn join(
        &mut self,
        sender: &ConnectionId,
        room: RoomName,
        user_id: UserId,
        display_name: DisplayName,
    ) -> Vec<Delivery> {
        let mut deliveries = Vec::new();

        // A connection is in at most one room: leave the previous one first.
        match self.registry.room_of(sender).cloned() {
            Some(previous) if previous != room => {
                deliveries.extend(self.leave(sender, &previous));
            }
            Some(same) => {
                if let Some(partner) = self.calls.end_call(&mut self.directory, &same, sender) {
                    deliveries.push(Delivery::unicast(
                        partner,
                        RelayNotice::CallEnded {
                            reason: CallEndReason::PartnerEnded,
                        },
                    ));
                }
            }
            None => {}
        }

        let now = self.now();
        let members = self.directory.join(
            &room,
            sender.clone(),
            user_id,
            display_name.clone(),
            now,
        );
        self.registry.set_room(sender, Some(room.clone()));
        tracing::info!(
            "User '{}' ({}) joined room '{}'",
            display_name,
            sender,
            room
        );

        for message in self.directory.replay(&room) {
            deliveries.push(Delivery::unicast(
                sender.clone(),
                RelayNotice::ReceiveMessage(message),
            ));
        }
        deliveries.push(presence(&room, members));
        deliveries
    }

    fn leave(&mut self, sender: &ConnectionId, room: &RoomName) -> Vec<Delivery> {
        let mut deliveries = Vec::new();

        if let Some(partner) = self.calls.end_call(&mut self.directory, room, sender) {
            deliveries.push(Delivery::unicast(
                partner,
                RelayNotice::CallEnded {
                    reason: CallEndReason::PartnerEnded,
                },
            ));
        }

        let now = self.now();
        if let Some(members) = self.directory.leave(room, sender, now) {
            deliveries.push(presence(room, members));
        }
        self.registry.set_room(sender, None);
        tracing::info!("Connection '{}' left room '{}'", sender, room);

        deliveries
    }

    fn code_change(
        &self,
        sender: &ConnectionId,
        room: &RoomName,
        file_id: String,
        content: String,
    ) -> Vec<Delivery> {
        // The sender already has the latest content.
        let targets: Vec<ConnectionId> = self
            .directory
            .list_members(room)
            .into_iter()
            .map(|m| m.connection_id)
            .filter(|id| id != sender)
            .collect();

        if targets.is_empty() {
            return Vec::new();
        }

        vec![Delivery {
            targets,
            notice: RelayNotice::CodeUpdate {
                file_id,
                content,
                sender: sender.clone(),
            },
        }]
    }

    fn send_message(&mut self, room: &RoomName, message: ChatMessage) -> Vec<Delivery> {
        tracing::info!(
            "Message in room '{}' from '{}' ({} bytes)",
            room,
            message.sender,
            message.text.as_str().len()
        );
        self.directory.append_message(room, message.clone());

        // Includes the sender: the echo doubles as its acknowledgement.
        let members = self.directory.list_members(room);
        vec![Delivery::to_members(
            &members,
            RelayNotice::ReceiveMessage(message),
        )]
    }

    fn request_call(
        &mut self,
        caller: &ConnectionId,
        room: &RoomName,
        offer: SignalPayload,
    ) -> Vec<Delivery> {
        let caller_display_name = match self.directory.member(room, caller) {
            Some(record) => record.display_name.clone(),
            None => return Vec::new(),
        };

        match self.calls.request_call(&mut self.directory, room, caller) {
            Ok(target) => {
                tracing::info!(
                    "Call request in room '{}': '{}' -> '{}'",
                    room,
                    caller,
                    target.connection_id
                );
                let mut deliveries = vec![Delivery::unicast(
                    target.connection_id.clone(),
                    RelayNotice::IncomingCall {
                        caller: caller.clone(),
                        caller_display_name,
                    },
                )];
                if !offer.is_null() {
                    deliveries.push(Delivery::unicast(
                        target.connection_id,
                        RelayNotice::Signal {
                            kind: SignalKind::Offer,
                            sender: caller.clone(),
                            payload: offer,
                        },
                    ));
                }
                deliveries.push(presence(room, self.directory.list_members(room)));
                deliveries
            }
            Err(CallError::NoPeersAvailable) => {
                tracing::info!("No available peers in room '{}' for '{}'", room, caller);
                vec![Delivery::unicast(
                    caller.clone(),
                    RelayNotice::CallEnded {
                        reason: CallEndReason::NoAvailablePeers,
                    },
                )]
            }
            Err(CallError::Busy) => {
                tracing::warn!("Rejecting call request from '{}': already in a call", caller);
                vec![Delivery::unicast(
                    caller.clone(),
                    RelayNotice::CallRejectedBusy,
                )]
            }
            Err(CallError::NotAMember) => {
                tracing::warn!("Dropping call request from non-member '{}'", caller);
                Vec::new()
            }
        }
    }

    fn accept_call(
        &mut self,
        callee: &ConnectionId,
        room: &RoomName,
        caller: ConnectionId,
    ) -> Vec<Delivery> {
        match self
            .calls
            .accept_call(&mut self.directory, room, callee, &caller)
        {
            AcceptOutcome::Established => {
                tracing::info!("Call established in room '{}': '{}' <-> '{}'", room, caller, callee);
                vec![
                    Delivery::unicast(
                        caller.clone(),
                        RelayNotice::CallEstablished {
                            remote: callee.clone(),
                        },
                    ),
                    Delivery::unicast(
                        callee.clone(),
                        RelayNotice::CallEstablished { remote: caller },
                    ),
                    presence(room, self.directory.list_members(room)),
                ]
            }
            AcceptOutcome::AlreadyConnected => {
                tracing::debug!("Ignoring repeated accept from '{}'", callee);
                Vec::new()
            }
            AcceptOutcome::Conflict => {
                tracing::warn!(
                    "Ignoring accept from '{}' for '{}': conflicting call state",
                    callee,
                    caller
                );
                Vec::new()
            }
        }
    }

    fn end_call(&mut self, sender: &ConnectionId, room: &RoomName) -> Vec<Delivery> {
        let Some(partner) = self.calls.end_call(&mut self.directory, room, sender) else {
            tracing::debug!("'{}' ended a call it was not in", sender);
            return Vec::new();
        };
        tracing::info!("Call between '{}' and '{}' ended", sender, partner);

        vec![
            Delivery::unicast(
                partner,
                RelayNotice::CallEnded {
                    reason: CallEndReason::PartnerEnded,
                },
            ),
            presence(room, self.directory.list_members(room)),
        ]
    }

    /// Unicast forward; the target is trusted, not checked against call sessions
    fn relay_signal(
        &self,
        sender: &ConnectionId,
        kind: SignalKind,
        target: ConnectionId,
        payload: SignalPayload,
    ) -> Vec<Delivery> {
        if !self.registry.contains(&target) {
            tracing::debug!("Dropping signaling from '{}' to unknown '{}'", sender, target);
            return Vec::new();
        }
        vec![Delivery::unicast(
            target,
            RelayNotice::Signal {
                kind,
                sender: sender.clone(),
                payload,
            },
        )]
    }
}

fn presence(room: &RoomName, users: Vec<PresenceRecord>) -> Delivery {
    Delivery::to_members(
        &users,
        RelayNotice::RoomUsersUpdate {
            room: room.clone(),
            users: users.clone(),
        },
    )
}

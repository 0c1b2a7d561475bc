//! Domain layer: relay state and the rules that mutate it.
//!
//! Nothing here performs I/O. Outbound collaborators are reached through the
//! [`MessagePusher`] and [`TraceService`] ports implemented by the
//! infrastructure layer.

pub mod call;
pub mod chat_history;
pub mod directory;
pub mod entity;
pub mod error;
pub mod event;
pub mod message_pusher;
pub mod registry;
pub mod trace;
pub mod value_object;

pub use call::{AcceptOutcome, CallCoordinator, DisconnectOutcome};
pub use chat_history::ChatHistory;
pub use directory::{Room, RoomDirectory};
pub use entity::{CallState, ChatMessage, PresenceRecord};
pub use error::{CallError, MessagePushError, TraceServiceError, ValueObjectError};
pub use event::{CallEndReason, Delivery, RelayEvent, RelayNotice, SignalKind, SignalPayload};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use registry::ConnectionRegistry;
pub use trace::{ExecutionTrace, StackFrame, TraceLanguage, TraceService, TraceStep};
pub use value_object::{
    ConnectionId, ConnectionIdFactory, DisplayName, MessageText, RoomName, Timestamp, UserId,
};

//! UseCase layer: event routing and the broker that serializes it.

mod broker;
mod error;
mod router;

pub use broker::{Broker, BrokerCommand, BrokerHandle, BrokerSettings};
pub use error::BrokerError;
pub use router::{MessageRouter, RoomSnapshot};

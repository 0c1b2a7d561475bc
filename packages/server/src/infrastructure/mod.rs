//! Infrastructure layer: wire formats and adapters for the domain ports.

pub mod dto;
pub mod message_pusher;
pub mod trace;

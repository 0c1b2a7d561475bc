//! Realtime collaboration relay.
//!
//! Members of a named room share presence, chat with replayable history,
//! broadcast code edits, and negotiate one-to-one calls whose WebRTC signaling
//! is relayed through the server.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;

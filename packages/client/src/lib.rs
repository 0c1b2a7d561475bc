//! Terminal client for the Kyodo collaboration relay.
//!
//! Joins a room, prints presence, chat, code updates and call events, and
//! sends chat lines or slash commands typed at the prompt.

pub mod command;
pub mod domain;
pub mod error;
pub mod formatter;
mod runner;
mod session;
mod ui;

pub use runner::run_client;
pub use session::ClientConfig;

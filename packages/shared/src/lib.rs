//! Utilities shared by the Kyodo relay server and terminal client.

pub mod logger;
pub mod time;

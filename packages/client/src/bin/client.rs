//! Terminal client for the Kyodo collaboration relay.
//!
//! Joins a room, shows presence, chat (with history replay), code updates and
//! call events. Lines typed at the prompt are sent as chat; `/help` lists the
//! commands. Automatically reconnects on disconnection (max 5 attempts with
//! 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kyodo-client -- --room demo --name Alice
//! cargo run --bin kyodo-client -- -r demo -n Bob --url ws://127.0.0.1:3000/ws
//! ```

use clap::Parser;

use kyodo_client::{ClientConfig, run_client};
use kyodo_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "kyodo-client")]
#[command(about = "Terminal client for the Kyodo collaboration relay", long_about = None)]
struct Args {
    /// Relay WebSocket URL
    #[arg(short = 'u', long, env = "KYODO_URL", default_value = "ws://127.0.0.1:3000/ws")]
    url: String,

    /// Room to join
    #[arg(short = 'r', long, env = "KYODO_ROOM")]
    room: String,

    /// Display name shown to other members
    #[arg(short = 'n', long, env = "KYODO_NAME")]
    name: String,

    /// Stable user id (defaults to the display name)
    #[arg(long, env = "KYODO_USER_ID")]
    user_id: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let config = ClientConfig {
        url: args.url,
        room: args.room,
        user_id: args.user_id.unwrap_or_else(|| args.name.clone()),
        display_name: args.name,
    };

    if let Err(e) = run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}

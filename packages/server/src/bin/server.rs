//! Kyodo collaboration relay.
//!
//! Room presence, chat with history replay, code-edit broadcast and one-to-one
//! call signaling over a single WebSocket endpoint.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kyodo-server
//! cargo run --bin kyodo-server -- --host 0.0.0.0 --port 3000 --history-capacity 500
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;

use kyodo_server::{
    config::RelayConfig,
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        trace::{PythonTutorClient, python_tutor::DEFAULT_ENDPOINT},
    },
    ui::Server,
    usecase::Broker,
};
use kyodo_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "kyodo-server")]
#[command(about = "Realtime collaboration relay (presence, chat, code sync, call signaling)", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "KYODO_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "KYODO_PORT", default_value = "3000")]
    port: u16,

    /// Chat messages kept per room (0 = unbounded)
    #[arg(long, env = "KYODO_HISTORY_CAPACITY", default_value = "0")]
    history_capacity: usize,

    /// Evict rooms that have had no members for this many seconds (0 = never)
    #[arg(long, env = "KYODO_ROOM_IDLE_TTL_SECS", default_value = "3600")]
    room_idle_ttl_secs: u64,

    /// Seconds between idle-room sweeps
    #[arg(long, env = "KYODO_EVICTION_INTERVAL_SECS", default_value = "60")]
    eviction_interval_secs: u64,

    /// Endpoint of the step-trace service used by /visualize
    #[arg(long, env = "KYODO_TRACE_SERVICE_URL", default_value = DEFAULT_ENDPOINT)]
    trace_service_url: String,

    /// Timeout for trace service requests, in seconds
    #[arg(long, env = "KYODO_TRACE_TIMEOUT_SECS", default_value = "20")]
    trace_timeout_secs: u64,
}

impl From<Args> for RelayConfig {
    fn from(args: Args) -> Self {
        RelayConfig::from_raw(
            args.host,
            args.port,
            args.history_capacity,
            args.room_idle_ttl_secs,
            args.eviction_interval_secs,
            args.trace_service_url,
            args.trace_timeout_secs,
        )
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let config = RelayConfig::from(Args::parse());
    tracing::debug!("Configuration: {:?}", config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: RelayConfig) -> Result<(), Box<dyn std::error::Error>> {
    // 1. Outbound adapters
    let message_pusher = Arc::new(WebSocketMessagePusher::new());
    let trace_service = Arc::new(PythonTutorClient::new(
        config.trace_service_url.clone(),
        config.trace_timeout,
    )?);

    // 2. Broker owning all relay state
    let (broker, broker_task) =
        Broker::from_config(&config, message_pusher, Arc::new(SystemClock)).spawn();

    // 3. HTTP/WebSocket server
    let server = Server::new(broker.clone(), trace_service);
    let result = server.run(config.host.clone(), config.port).await;

    // Stop the broker even if the server failed
    if broker.shutdown().is_ok()
        && tokio::time::timeout(Duration::from_secs(5), broker_task)
            .await
            .is_err()
    {
        tracing::warn!("Broker did not stop within 5 seconds");
    }

    result
}

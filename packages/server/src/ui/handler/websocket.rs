//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    domain::{ConnectionId, ConnectionIdFactory, RelayEvent},
    infrastructure::dto::websocket::ClientEvent,
    ui::state::AppState,
    usecase::{BrokerError, BrokerHandle},
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that forwards encoded notices from `rx` to the WebSocket.
///
/// The task ends when the broker drops the channel (connection unregistered
/// or broker stopped) or when the socket refuses a write.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    })
}

/// Decode one text frame and hand it to the broker.
///
/// Malformed or invalid frames are logged and dropped; only a stopped broker
/// is reported to the caller.
fn forward_frame(
    broker: &BrokerHandle,
    connection_id: &ConnectionId,
    text: &str,
) -> Result<(), BrokerError> {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Malformed frame from '{}': {}", connection_id, e);
            return Ok(());
        }
    };

    let event = match RelayEvent::try_from(event) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Invalid event from '{}': {}", connection_id, e);
            return Ok(());
        }
    };

    tracing::debug!("Received '{}' from '{}'", event.name(), connection_id);
    broker.dispatch(connection_id.clone(), event)
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionIdFactory::generate();
    let (tx, rx) = mpsc::unbounded_channel();

    if let Err(e) = state.broker.connect(connection_id.clone(), tx) {
        tracing::error!("Rejecting connection '{}': {}", connection_id, e);
        return;
    }
    tracing::info!("Connection '{}' opened", connection_id);

    let (sender, mut receiver) = socket.split();

    // Outbound: notices routed to this connection
    let mut send_task = pusher_loop(rx, sender);

    // Inbound: frames from this connection
    let broker = state.broker.clone();
    let id = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on '{}': {}", id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    if let Err(e) = forward_frame(&broker, &id, text.as_str()) {
                        tracing::error!("Dropping connection '{}': {}", id, e);
                        break;
                    }
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", id);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    match state.broker.disconnect(connection_id.clone()) {
        Ok(()) => tracing::info!("Connection '{}' closed", connection_id),
        Err(e) => tracing::warn!("Connection '{}' closed after broker stop: {}", connection_id, e),
    }
}

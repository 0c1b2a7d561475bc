//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use kyodo_server::infrastructure::dto::websocket::{ClientEvent, ServerEvent};
use kyodo_shared::time::now_millis;

use crate::{
    command::{HELP, InputCommand},
    domain::SessionState,
    error::ClientError,
    formatter::MessageFormatter,
};

use super::ui::redisplay_prompt;

/// Who to be and where to connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub url: String,
    pub room: String,
    pub user_id: String,
    pub display_name: String,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ClientError> {
        for (field, value) in [
            ("room", &self.room),
            ("user id", &self.user_id),
            ("name", &self.display_name),
        ] {
            if value.trim().is_empty() {
                return Err(ClientError::InvalidArgument(format!(
                    "{} must not be empty",
                    field
                )));
            }
        }
        Ok(())
    }
}

fn encode(event: &ClientEvent) -> Result<Message, ClientError> {
    serde_json::to_string(event)
        .map(|json| Message::Text(json.into()))
        .map_err(|e| ClientError::ConnectionError(format!("failed to encode frame: {}", e)))
}

/// Run one connection: join the room, then pump frames and prompt input
/// until the user quits (`Ok`) or the connection drops (`Err`).
pub async fn run_client_session(
    config: &ClientConfig,
    input: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), ClientError> {
    let (ws_stream, _response) = connect_async(config.url.as_str())
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to relay at {}", config.url);
    println!(
        "\nYou are '{}' in room '{}'. Type messages and press Enter to send, /help for commands.\n",
        config.display_name, config.room
    );

    let (mut write, mut read) = ws_stream.split();
    let mut state = SessionState::new(
        config.room.clone(),
        config.user_id.clone(),
        config.display_name.clone(),
    );

    let join = state.join_event();
    write
        .send(encode(&join)?)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    loop {
        tokio::select! {
            message = read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ServerEvent>(text.as_str()) {
                            Ok(event) => {
                                state.apply(&event);
                                let formatted = MessageFormatter::format_event(
                                    &event,
                                    state.connection_id.as_deref(),
                                );
                                print!("{}", formatted);
                            }
                            Err(_) => print!("{}", MessageFormatter::format_raw_message(text.as_str())),
                        }
                        redisplay_prompt(&config.display_name);
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!("Server closed the connection");
                        return Err(ClientError::ConnectionError("Connection lost".to_string()));
                    }
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket read error: {}", e);
                        return Err(ClientError::ConnectionError(e.to_string()));
                    }
                    Some(Ok(_)) => {}
                }
            }
            line = input.recv() => {
                // Input thread gone (Ctrl+C / Ctrl+D): treat as quit
                let Some(line) = line else {
                    let _ = write.close().await;
                    return Ok(());
                };
                let Some(command) = InputCommand::parse(&line) else {
                    continue;
                };

                match &command {
                    InputCommand::Quit => {
                        let _ = write.close().await;
                        return Ok(());
                    }
                    InputCommand::Who => {
                        print!(
                            "{}",
                            MessageFormatter::format_presence(
                                &state.room,
                                &state.users,
                                state.connection_id.as_deref(),
                            )
                        );
                    }
                    InputCommand::Help => print!("\n{}", HELP),
                    InputCommand::Unknown(name) => println!("\nUnknown command '/{}'. Try /help.", name),
                    _ => {}
                }

                if let Some(event) = state.event_for(&command, now_millis()) {
                    if let Err(e) = write.send(encode(&event)?).await {
                        tracing::warn!("Failed to send frame: {}", e);
                        return Err(ClientError::ConnectionError(e.to_string()));
                    }
                } else if matches!(command, InputCommand::Chat(_) | InputCommand::Accept(_)) {
                    println!("\n(nothing sent)");
                }
                redisplay_prompt(&config.display_name);
            }
        }
    }
}

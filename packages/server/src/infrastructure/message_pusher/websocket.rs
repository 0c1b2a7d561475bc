//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を管理
//! - `RelayNotice` を JSON フレームにエンコードして送信（push_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成と書き込みは UI 層（`ui/handler/websocket.rs`）で行われます。
//! ここではチャネルへの送信のみを行うため、Broker がソケットを待つことはありません。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel, RelayNotice},
    infrastructure::dto::websocket::ServerEvent,
};

/// WebSocket を使った MessagePusher 実装
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// Key: 接続 ID / Value: その接続の送信チャネル
    clients: Mutex<HashMap<ConnectionId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn client_count(&self) -> usize {
        self.clients.lock().await.len()
    }
}

/// 通知を 1 回だけエンコードし、全宛先で同じフレームを使う
fn encode(notice: &RelayNotice) -> Result<String, MessagePushError> {
    let event = ServerEvent::from(notice.clone());
    serde_json::to_string(&event).map_err(|e| MessagePushError::PushFailed(e.to_string()))
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
        clients.insert(connection_id, sender);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        clients.remove(connection_id);
        tracing::debug!(
            "Connection '{}' unregistered from MessagePusher",
            connection_id
        );
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        notice: &RelayNotice,
    ) -> Result<(), MessagePushError> {
        let frame = encode(notice)?;
        let clients = self.clients.lock().await;

        let Some(sender) = clients.get(connection_id) else {
            return Err(MessagePushError::ClientNotFound(
                connection_id.as_str().to_string(),
            ));
        };
        sender
            .send(frame)
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed notice to connection '{}'", connection_id);
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: &[ConnectionId],
        notice: &RelayNotice,
    ) -> Result<(), MessagePushError> {
        let frame = encode(notice)?;
        let clients = self.clients.lock().await;

        for target in targets {
            match clients.get(target) {
                // ブロードキャストでは一部の送信失敗を許容
                Some(sender) => {
                    if let Err(e) = sender.send(frame.clone()) {
                        tracing::warn!("Failed to push notice to connection '{}': {}", target, e);
                    }
                }
                None => {
                    tracing::warn!(
                        "Connection '{}' not found during broadcast, skipping",
                        target
                    );
                }
            }
        }

        Ok(())
    }
}

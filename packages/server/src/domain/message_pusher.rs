//! Outbound port: delivery of notices to live connections.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{error::MessagePushError, event::RelayNotice, value_object::ConnectionId};

/// Channel feeding one connection's socket writer
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Pushes relay notices to connections.
///
/// Implementations encode the notice for their transport. Sends never wait
/// for the peer: a connection that died mid-send simply misses the notice.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// Push to one connection, failing if it is unknown or its channel is closed
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        notice: &RelayNotice,
    ) -> Result<(), MessagePushError>;

    /// Push to every target, skipping unknown or closed connections
    async fn broadcast(
        &self,
        targets: &[ConnectionId],
        notice: &RelayNotice,
    ) -> Result<(), MessagePushError>;
}

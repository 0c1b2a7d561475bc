//! Broker: the single task that owns all relay state.
//!
//! Connection tasks never touch room state. They send [`BrokerCommand`]s over
//! an unbounded channel through a [`BrokerHandle`]; the broker applies them one
//! at a time through the [`MessageRouter`] and hands the resulting deliveries to
//! the [`MessagePusher`]. Pushing only enqueues on per-connection channels, so
//! the broker never waits on a socket.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

use kyodo_shared::time::Clock;

use crate::config::RelayConfig;
use crate::domain::{ConnectionId, Delivery, MessagePusher, PusherChannel, RelayEvent, RoomName};

use super::{
    error::BrokerError,
    router::{MessageRouter, RoomSnapshot},
};

/// Tuning of the broker's housekeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    /// Rooms empty for this long are evicted; `None` keeps them forever
    pub room_idle_ttl: Option<Duration>,
    /// How often idle rooms are swept
    pub eviction_interval: Duration,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            room_idle_ttl: Some(Duration::from_secs(3600)),
            eviction_interval: Duration::from_secs(60),
        }
    }
}

/// Commands processed by the broker task, in arrival order
#[derive(Debug)]
pub enum BrokerCommand {
    Connect {
        connection_id: ConnectionId,
        channel: PusherChannel,
    },
    Dispatch {
        connection_id: ConnectionId,
        event: RelayEvent,
    },
    Disconnect {
        connection_id: ConnectionId,
    },
    ListRooms {
        reply: oneshot::Sender<Vec<RoomSnapshot>>,
    },
    RoomDetail {
        room: RoomName,
        reply: oneshot::Sender<Option<RoomSnapshot>>,
    },
    EvictIdle,
    Shutdown,
}

/// Cloneable entry point to the broker task
#[derive(Debug, Clone)]
pub struct BrokerHandle {
    commands: mpsc::UnboundedSender<BrokerCommand>,
}

impl BrokerHandle {
    fn send(&self, command: BrokerCommand) -> Result<(), BrokerError> {
        self.commands
            .send(command)
            .map_err(|_| BrokerError::Stopped)
    }

    /// Register a connection and the channel its notices are written to
    pub fn connect(
        &self,
        connection_id: ConnectionId,
        channel: PusherChannel,
    ) -> Result<(), BrokerError> {
        self.send(BrokerCommand::Connect {
            connection_id,
            channel,
        })
    }

    pub fn dispatch(&self, connection_id: ConnectionId, event: RelayEvent) -> Result<(), BrokerError> {
        self.send(BrokerCommand::Dispatch {
            connection_id,
            event,
        })
    }

    /// Transport-level disconnect; always processed, even mid-send
    pub fn disconnect(&self, connection_id: ConnectionId) -> Result<(), BrokerError> {
        self.send(BrokerCommand::Disconnect { connection_id })
    }

    pub async fn list_rooms(&self) -> Result<Vec<RoomSnapshot>, BrokerError> {
        let (reply, rx) = oneshot::channel();
        self.send(BrokerCommand::ListRooms { reply })?;
        rx.await.map_err(|_| BrokerError::Stopped)
    }

    pub async fn room_detail(&self, room: RoomName) -> Result<Option<RoomSnapshot>, BrokerError> {
        let (reply, rx) = oneshot::channel();
        self.send(BrokerCommand::RoomDetail { room, reply })?;
        rx.await.map_err(|_| BrokerError::Stopped)
    }

    /// Sweep idle rooms now instead of waiting for the next interval
    pub fn evict_idle(&self) -> Result<(), BrokerError> {
        self.send(BrokerCommand::EvictIdle)
    }

    pub fn shutdown(&self) -> Result<(), BrokerError> {
        self.send(BrokerCommand::Shutdown)
    }
}

/// Owner of the relay state
pub struct Broker {
    router: MessageRouter,
    pusher: Arc<dyn MessagePusher>,
    settings: BrokerSettings,
}

impl Broker {
    pub fn new(
        router: MessageRouter,
        pusher: Arc<dyn MessagePusher>,
        settings: BrokerSettings,
    ) -> Self {
        Self {
            router,
            pusher,
            settings,
        }
    }

    /// Fresh relay state sized by `config`
    pub fn from_config(
        config: &RelayConfig,
        pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let router = MessageRouter::new(config.history_capacity, clock);
        Self::new(router, pusher, config.broker_settings())
    }

    /// Start the broker task on the current tokio runtime
    pub fn spawn(self) -> (BrokerHandle, JoinHandle<()>) {
        let (commands, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(rx));
        (BrokerHandle { commands }, task)
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<BrokerCommand>) {
        let period = self.settings.eviction_interval;
        let mut sweep = self.settings.room_idle_ttl.map(|_| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        tracing::info!("Broker started");

        loop {
            let command = match sweep.as_mut() {
                Some(interval) => tokio::select! {
                    command = commands.recv() => command,
                    _ = interval.tick() => Some(BrokerCommand::EvictIdle),
                },
                None => commands.recv().await,
            };

            let Some(command) = command else {
                break;
            };
            if !self.handle(command).await {
                break;
            }
        }

        tracing::info!(
            "Broker stopped with {} live connection(s)",
            self.router.connection_count()
        );
    }

    /// Apply one command; returns `false` when the broker should stop
    async fn handle(&mut self, command: BrokerCommand) -> bool {
        match command {
            BrokerCommand::Connect {
                connection_id,
                channel,
            } => {
                self.pusher
                    .register_client(connection_id.clone(), channel)
                    .await;
                let deliveries = self.router.connect(connection_id);
                self.deliver(deliveries).await;
            }
            BrokerCommand::Dispatch {
                connection_id,
                event,
            } => {
                let deliveries = self.router.dispatch(&connection_id, event);
                self.deliver(deliveries).await;
            }
            BrokerCommand::Disconnect { connection_id } => {
                let deliveries = self.router.disconnect(&connection_id);
                self.pusher.unregister_client(&connection_id).await;
                self.deliver(deliveries).await;
            }
            BrokerCommand::ListRooms { reply } => {
                // The requester may have given up; nothing to do then.
                let _ = reply.send(self.router.room_snapshots());
            }
            BrokerCommand::RoomDetail { room, reply } => {
                let _ = reply.send(self.router.room_snapshot(&room));
            }
            BrokerCommand::EvictIdle => {
                if let Some(ttl) = self.settings.room_idle_ttl {
                    let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
                    self.router.evict_idle(ttl_millis);
                }
            }
            BrokerCommand::Shutdown => return false,
        }
        true
    }

    /// Best-effort fan-out: lost notices are not retried
    async fn deliver(&self, deliveries: Vec<Delivery>) {
        for delivery in deliveries {
            match delivery.targets.as_slice() {
                [] => {}
                [target] => {
                    if let Err(e) = self.pusher.push_to(target, &delivery.notice).await {
                        tracing::debug!("Dropped notice for '{}': {}", target, e);
                    }
                }
                targets => {
                    if let Err(e) = self.pusher.broadcast(targets, &delivery.notice).await {
                        tracing::warn!("Broadcast failed: {}", e);
                    }
                }
            }
        }
    }
}

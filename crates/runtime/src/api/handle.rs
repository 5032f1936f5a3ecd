//! Cloneable façade over a running lobby.
//!
//! [`LobbyHandle`] hides channel plumbing: every [`LobbyHandle::connect`]
//! spawns a session task and returns the two queues a transport adapter
//! pumps.
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use super::errors::{Result, RuntimeError};
use crate::config::RuntimeConfig;
use crate::events::{Event, EventBus, Topic};
use crate::lobby::{Lobby, RoomInfo, Session};
use crate::oracle::OracleManager;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::types::{RoomId, SessionId};

#[derive(Clone)]
pub struct LobbyHandle {
    lobby: Arc<Lobby>,
}

impl LobbyHandle {
    pub fn new(config: RuntimeConfig, oracles: OracleManager) -> Self {
        Self {
            lobby: Arc::new(Lobby::new(config, oracles)),
        }
    }

    /// Accepts a new participant. Must be called inside a tokio runtime.
    pub fn connect(&self) -> Connection {
        let id = self.lobby.next_session();
        let buffer = self.lobby.config.outbound_buffer_size;
        let (inbound_tx, inbound_rx) = mpsc::channel(buffer);
        let (outbound_tx, outbound_rx) = mpsc::channel(buffer);

        let session = Session::new(id, Arc::clone(&self.lobby), inbound_rx, outbound_tx);
        tokio::spawn(session.run());

        Connection {
            id,
            inbound: inbound_tx,
            outbound: outbound_rx,
        }
    }

    pub async fn queue_len(&self) -> usize {
        self.lobby.queue.len().await
    }

    pub async fn active_rooms(&self) -> usize {
        self.lobby.rooms.len().await
    }

    pub async fn room(&self, room: RoomId) -> Option<RoomInfo> {
        self.lobby.rooms.get(room).await
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.lobby.config
    }

    /// Subscribe to events from a specific topic
    ///
    /// - `Topic::Lobby` - queue arrivals, departures and matches
    /// - `Topic::Room` - round commit logs and room results
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.lobby.bus.subscribe(topic)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.lobby.bus
    }
}

/// One participant's link to the lobby. Dropping it, or the sender half
/// returned by [`Connection::split`], disconnects the participant.
pub struct Connection {
    id: SessionId,
    inbound: mpsc::Sender<ClientMessage>,
    outbound: mpsc::Receiver<ServerMessage>,
}

impl Connection {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub async fn send(&self, message: ClientMessage) -> Result<()> {
        self.inbound
            .send(message)
            .await
            .map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Next message for this participant; `None` once the session ended.
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        self.outbound.recv().await
    }

    pub fn split(self) -> (mpsc::Sender<ClientMessage>, mpsc::Receiver<ServerMessage>) {
        (self.inbound, self.outbound)
    }
}

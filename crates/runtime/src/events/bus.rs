//! Topic-based event bus implementation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{LobbyEvent, RoomEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Queue arrivals, departures and matches
    Lobby,
    /// Round commits and room results
    Room,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Lobby(LobbyEvent),
    Room(RoomEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Lobby(_) => Topic::Lobby,
            Event::Room(_) => Topic::Room,
        }
    }
}

struct Channels {
    lobby: broadcast::Sender<Event>,
    room: broadcast::Sender<Event>,
}

/// Topic-based event bus
///
/// Subscribers only receive the topics they ask for. Publishing never blocks
/// and is dropped silently when nobody listens.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Channels {
                lobby: broadcast::channel(capacity).0,
                room: broadcast::channel(capacity).0,
            }),
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Lobby => &self.channels.lobby,
            Topic::Room => &self.channels.room,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RoomId, SessionId};

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::with_capacity(4);
        let mut lobby = bus.subscribe(Topic::Lobby);
        let mut room = bus.subscribe(Topic::Room);

        bus.publish(Event::Lobby(LobbyEvent::Left {
            session: SessionId(1),
            username: "ada".into(),
        }));
        bus.publish(Event::Lobby(LobbyEvent::Matched {
            room: RoomId(3),
            players: ["ada".into(), "brook".into()],
        }));

        assert!(matches!(lobby.recv().await, Ok(Event::Lobby(LobbyEvent::Left { .. }))));
        assert!(matches!(lobby.recv().await, Ok(Event::Lobby(LobbyEvent::Matched { .. }))));
        assert!(room.try_recv().is_err());
    }
}

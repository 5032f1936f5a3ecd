//! Registry of active rooms.
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::types::RoomId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomInfo {
    pub players: [String; 2],
}

/// Shared set of open rooms. Each room is closed by its own worker; closing
/// twice is a no-op.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<Mutex<HashMap<RoomId, RoomInfo>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn open(&self, room: RoomId, info: RoomInfo) {
        self.rooms.lock().await.insert(room, info);
    }

    /// `true` only for the call that actually closed the room.
    pub async fn close(&self, room: RoomId) -> bool {
        self.rooms.lock().await.remove(&room).is_some()
    }

    pub async fn get(&self, room: RoomId) -> Option<RoomInfo> {
        self.rooms.lock().await.get(&room).cloned()
    }

    pub async fn len(&self) -> usize {
        self.rooms.lock().await.len()
    }
}

//! Identifiers and snapshots shared across the lobby and rooms.
use std::fmt;

use duel_content::{AggregatedMember, TeamId};
use duel_core::{CharacterState, Slot};
use serde::{Deserialize, Serialize};

/// One accepted connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room#{}", self.0)
    }
}

/// What the lobby knows about an authenticated player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub username: String,
    pub games_played: u32,
}

/// A team resolved at selection time. Members keep their catalog ids until a
/// room seats them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TeamSnapshot {
    pub id: TeamId,
    pub name: String,
    pub members: Vec<AggregatedMember>,
}

/// A character as shown to clients: its state plus where it stands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatedCharacter {
    pub slot: Slot,
    pub character: CharacterState,
}

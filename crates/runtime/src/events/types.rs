use duel_core::{Outcome, RoundReport};
use serde::{Deserialize, Serialize};

use crate::types::{RoomId, SessionId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LobbyEvent {
    Queued {
        session: SessionId,
        username: String,
        games_played: u32,
    },
    /// A queued player disconnected before being matched.
    Left {
        session: SessionId,
        username: String,
    },
    Matched {
        room: RoomId,
        players: [String; 2],
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomEvent {
    /// The full commit log of a resolved round, with its callback failures.
    RoundCommitted { room: RoomId, report: RoundReport },
    /// Published once per room, when it closes.
    Finished {
        room: RoomId,
        outcome: Outcome,
        forfeit: bool,
    },
}

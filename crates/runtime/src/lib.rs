//! Async orchestration for two-player duels.
//!
//! This crate wires the deterministic [`duel_core`] battle into a lobby that
//! authenticates players, matches them and runs one worker task per room.
//! Transports embed a [`LobbyHandle`] and pump each participant's
//! [`Connection`].
//!
//! Modules are organized by responsibility:
//! - [`api`] exposes the handle, connection and error types
//! - [`lobby`] hosts sessions, the waiting queue and the room registry
//! - `room` runs the per-room phase state machine
//! - [`events`] provides a topic-based event bus for observers
//! - [`oracle`] adapts content lookups for the lobby
pub mod api;
pub mod config;
pub mod events;
pub mod lobby;
pub mod oracle;
pub mod protocol;
pub mod types;

mod room;

pub use api::{Connection, LobbyHandle, OracleError, Result, RuntimeError};
pub use config::RuntimeConfig;
pub use events::{Event, EventBus, LobbyEvent, RoomEvent, Topic};
pub use lobby::{RoomInfo, RoomRegistry};
pub use oracle::{AccountOracle, CatalogOracle, OracleManager, TeamOracle};
pub use protocol::{
    ClientMessage, DecisionAction, FinishReason, PROTOCOL_VERSION, Perspective, RoundEntry,
    ServerMessage, relabel,
};
pub use types::{PlayerSummary, RoomId, SeatedCharacter, SessionId, TeamSnapshot};

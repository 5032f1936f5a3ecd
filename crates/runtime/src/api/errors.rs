//! Unified error types surfaced by the runtime API.
use duel_content::{ContentError, TeamId};
use duel_core::{CastError, PlacementError, SchedulerError, Side};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    InvalidCast(#[from] CastError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("player on side {0} lost the connection")]
    ConnectionLost(Side),

    #[error("session channel closed")]
    ChannelClosed,
}

/// Failures of the content collaborators the lobby consults.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("unknown {0}")]
    UnknownTeam(TeamId),

    #[error("{team} does not belong to {owner}")]
    NotOwner { team: TeamId, owner: String },

    #[error(transparent)]
    Content(#[from] ContentError),
}

//! Error types for the combat core.
//!
//! Each layer owns its own error enum:
//! - [`CastError`]: a decision could not be turned into a cast instance
//! - [`SchedulerError`]: a token or phase operation was rejected by the scheduler
//! - [`EffectError`]: a scheduled callback failed while firing
//!
//! None of these are fatal to a battle. Callers log them and carry on.
use std::fmt;

use thiserror::Error;

use crate::ids::{CastId, CharacterId, Round, SkillId};
use crate::scheduler::{Phase, Token, TokenKind};

/// Number of targets a targeting mode accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "exactly {n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// Reasons a caller/target selection cannot become a cast instance.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CastError {
    #[error("unknown skill {0}")]
    UnknownSkill(SkillId),

    #[error("{skill} expects {expected} target(s), got {provided}")]
    TargetArity {
        skill: SkillId,
        expected: Arity,
        provided: usize,
    },

    #[error("{skill} needs two distinct targets")]
    DuplicateTarget { skill: SkillId },

    #[error("unknown caller {0}")]
    UnknownCaller(CharacterId),

    #[error("unknown target {0}")]
    UnknownTarget(CharacterId),

    #[error("{caller} has not learned {skill}")]
    SkillNotLearned { caller: CharacterId, skill: SkillId },
}

/// Rejected scheduler operations.
///
/// Token errors are reported to the caller but never abort the round.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("unknown token {0:?}")]
    UnknownToken(Token),

    /// The token fired, was cancelled or was unregistered.
    #[error("token {0:?} is spent")]
    Spent(Token),

    #[error("token {token:?} is not a {expected:?} token")]
    WrongKind { token: Token, expected: TokenKind },

    #[error("phase {requested} requested but {expected} is next")]
    PhaseOutOfOrder { expected: Phase, requested: Phase },

    #[error("phase {phase} already ran in round {round}")]
    PhaseElapsed { phase: Phase, round: Round },

    #[error("round {round} already ran all phases")]
    RoundComplete { round: Round },

    #[error("round {round} cannot finish before {next} runs")]
    RoundIncomplete { round: Round, next: Phase },
}

impl SchedulerError {
    /// True for errors that only report a stale token (safe to ignore).
    pub fn is_stale_token(&self) -> bool {
        matches!(self, SchedulerError::Spent(_))
    }
}

/// Failure raised by a skill callback.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EffectError {
    #[error("callback refers to unknown {0}")]
    UnknownCast(CastId),

    #[error("{0} is already running")]
    Reentrant(CastId),

    #[error("unknown character {0}")]
    UnknownCharacter(CharacterId),

    #[error("{skill} is misconfigured: {reason}")]
    Misconfigured {
        skill: SkillId,
        reason: &'static str,
    },

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

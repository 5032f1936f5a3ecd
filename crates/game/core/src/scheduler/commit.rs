//! Per-round commit log entries.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::character::Change;
use crate::ids::{CastId, CharacterId, Round, SkillId};
use crate::scheduler::{Phase, Token};

bitflags! {
    /// Outcome markers attached to a commit so clients can render effects
    /// that produced no changes.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CommitFlags: u8 {
        /// At least one target evaded the skill.
        const MISSED = 0b0000_0001;
        /// The skill landed a critical hit.
        const CRITICAL = 0b0000_0010;
        /// An active status prevented the caller from acting.
        const BLOCKED = 0b0000_0100;
        /// The caller could not pay the skill's cost.
        const EXHAUSTED = 0b0000_1000;
        /// The caller or every target died before the action resolved.
        const DIED_BEFORE_ACTION = 0b0001_0000;
        /// A target refused the effect and partial effects were rolled back.
        const REJECTED = 0b0010_0000;
    }
}

/// Changes produced by one firing of a cast's callback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub cast: CastId,
    pub skill: SkillId,
    pub caller: CharacterId,
    pub phase: Phase,
    pub changes: Vec<Change>,
    pub flags: CommitFlags,
}

impl Commit {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.flags.is_empty()
    }

    pub fn died_before_action(&self) -> bool {
        self.flags.contains(CommitFlags::DIED_BEFORE_ACTION)
    }
}

/// A callback that failed while its phase ran.
///
/// Failures never stop sibling callbacks; they are attached to the round's
/// commit log as warnings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectFailure {
    pub round: Round,
    pub phase: Phase,
    /// Missing for failures raised outside a scheduled callback (cast init).
    pub token: Option<Token>,
    pub message: String,
}

/// Summary returned by [`super::RoundScheduler::run_phase`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseReport {
    pub round: Round,
    pub phase: Phase,
    pub fired: usize,
    pub failed: usize,
}

//! Status effects held by a character.
//!
//! A character holds at most one effect per [`StatusKind`]. The expiry round
//! doubles as priority: a new grant only replaces an existing effect when it
//! expires strictly later, so ties keep the current holder.
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::ids::{CastId, Round, SkillId};

/// Identifier of a status effect.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatusKind {
    // Crowd control
    Stunned,
    Silenced,
    Rooted,

    // Damage over time
    Poisoned,
    Burning,

    // Buffs
    Fortified,
    Shielded,
    Hasted,

    // Debuffs
    Weakened,

    // Special states
    Linked,
    Morphed,
}

/// An active status effect and the cast that maintains it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub owner: CastId,
    pub skill: SkillId,
    /// Round at whose end the effect lapses; also its priority.
    pub expires: Round,
    /// Removal of a silent effect is never logged.
    pub silent: bool,
}

/// Result of granting a single status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grant {
    /// The status took. `displaced` is the cast that held it before, if any.
    Granted { displaced: Option<CastId> },
    /// A stronger or equal effect already holds the status.
    Rejected { holder: CastId },
    /// The character is not alive.
    Dead,
}

impl Grant {
    pub fn is_granted(self) -> bool {
        matches!(self, Grant::Granted { .. })
    }
}

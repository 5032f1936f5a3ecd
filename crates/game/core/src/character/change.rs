use serde::{Deserialize, Serialize};

use crate::character::{StatKind, StatusKind};
use crate::ids::{CharacterId, ClassId};

/// Direction of a status change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusDelta {
    #[serde(rename = "+")]
    Applied,
    #[serde(rename = "-")]
    Removed,
}

/// What a [`Change`] touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeKind {
    Stat { stat: StatKind, delta: i32 },
    Status { status: StatusKind, delta: StatusDelta },
    Class { class: ClassId },
}

/// Immutable record of one observable mutation.
///
/// Only [`super::CharacterState`] mutators construct changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Change {
    character: CharacterId,
    #[serde(flatten)]
    kind: ChangeKind,
}

impl Change {
    pub(crate) fn stat(character: CharacterId, stat: StatKind, delta: i32) -> Self {
        Self {
            character,
            kind: ChangeKind::Stat { stat, delta },
        }
    }

    pub(crate) fn status(character: CharacterId, status: StatusKind, delta: StatusDelta) -> Self {
        Self {
            character,
            kind: ChangeKind::Status { status, delta },
        }
    }

    pub(crate) fn class(character: CharacterId, class: ClassId) -> Self {
        Self {
            character,
            kind: ChangeKind::Class { class },
        }
    }

    pub fn character(&self) -> CharacterId {
        self.character
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// Signed stat delta, if this is a stat change.
    pub fn stat_delta(&self) -> Option<(StatKind, i32)> {
        match self.kind {
            ChangeKind::Stat { stat, delta } => Some((stat, delta)),
            _ => None,
        }
    }
}

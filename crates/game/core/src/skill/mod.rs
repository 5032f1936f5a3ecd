//! Skill definitions, targeting and casting.
//!
//! A [`SkillDefinition`] is an immutable template loaded from content. Casting
//! binds it to a caller and a resolved target set, producing a
//! [`CastInstance`] that owns a fresh [`SkillBehavior`] for its
//! [`SkillKind`]. Behaviors only schedule work in `init`; every mutation
//! happens later through [`Effects`] while the scheduler runs a phase.
mod behavior;
mod book;
mod cast;
pub mod kinds;
mod targeting;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::character::{StatKind, StatusKind};
use crate::damage::DamageType;
use crate::ids::{ClassId, SkillId};

pub use behavior::{Callback, CastContext, Effects, Hook, SkillBehavior};
pub use book::SkillBook;
pub use cast::{CastArena, CastInfo, CastInstance, cast};
pub use targeting::{TargetingMode, Targets};

/// Which behavior a skill runs.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkillKind {
    /// Damage every target.
    Strike,
    /// Damage every target and heal the caller by half the damage dealt.
    Drain,
    /// Heal every target.
    Mend,
    /// Temporary stat change backed by a status.
    Fortify,
    /// Timed status on every target.
    Afflict,
    /// Damage over time while a status holds.
    Poison,
    /// Symmetric status on exactly two targets; all or nothing.
    Link,
    /// Strip statuses from every target.
    Cleanse,
    /// Temporary class change.
    Metamorph,
}

/// Resource spent when the skill resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cost {
    pub stat: StatKind,
    pub amount: i32,
}

fn default_accuracy() -> u8 {
    100
}

/// Immutable skill template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub id: SkillId,
    pub name: String,
    pub kind: SkillKind,
    pub targeting: TargetingMode,
    #[serde(default)]
    pub damage_type: Option<DamageType>,
    #[serde(default)]
    pub cost: Option<Cost>,
    /// Base hit chance in percent.
    #[serde(default = "default_accuracy")]
    pub accuracy: u8,
    /// Critical chance in percent.
    #[serde(default)]
    pub critical: u8,
    /// Statuses on the caller that prevent the skill from resolving.
    #[serde(default)]
    pub blocked_by: Vec<StatusKind>,
    /// Damage, heal amount, stat delta or tick damage depending on the kind.
    #[serde(default)]
    pub power: i32,
    /// Rounds a status lasts, counting the round it is applied in.
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub status: Option<StatusKind>,
    #[serde(default)]
    pub stat: Option<StatKind>,
    #[serde(default)]
    pub dispels: Vec<StatusKind>,
    #[serde(default)]
    pub class_shift: Option<ClassId>,
}

impl SkillDefinition {
    pub fn new(
        id: SkillId,
        name: impl Into<String>,
        kind: SkillKind,
        targeting: TargetingMode,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            targeting,
            damage_type: None,
            cost: None,
            accuracy: default_accuracy(),
            critical: 0,
            blocked_by: Vec::new(),
            power: 0,
            duration: 0,
            status: None,
            stat: None,
            dispels: Vec::new(),
            class_shift: None,
        }
    }

    pub fn with_damage(mut self, damage_type: DamageType, power: i32) -> Self {
        self.damage_type = Some(damage_type);
        self.power = power;
        self
    }

    pub fn with_power(mut self, power: i32) -> Self {
        self.power = power;
        self
    }

    pub fn with_cost(mut self, stat: StatKind, amount: i32) -> Self {
        self.cost = Some(Cost { stat, amount });
        self
    }

    pub fn with_accuracy(mut self, accuracy: u8, critical: u8) -> Self {
        self.accuracy = accuracy;
        self.critical = critical;
        self
    }

    pub fn with_status(mut self, status: StatusKind, duration: u32) -> Self {
        self.status = Some(status);
        self.duration = duration;
        self
    }

    pub fn with_stat(mut self, stat: StatKind) -> Self {
        self.stat = Some(stat);
        self
    }

    pub fn blocked_by(mut self, statuses: impl IntoIterator<Item = StatusKind>) -> Self {
        self.blocked_by = statuses.into_iter().collect();
        self
    }

    pub fn dispelling(mut self, statuses: impl IntoIterator<Item = StatusKind>) -> Self {
        self.dispels = statuses.into_iter().collect();
        self
    }

    pub fn morphing_into(mut self, class: ClassId) -> Self {
        self.class_shift = Some(class);
        self
    }

    /// Checks that the fields the skill's kind reads are present.
    pub fn check(&self) -> Result<(), &'static str> {
        match self.kind {
            SkillKind::Strike | SkillKind::Drain if self.damage_type.is_none() => {
                Err("damaging skills need a damage type")
            }
            SkillKind::Fortify if self.stat.is_none() => Err("fortify needs a stat"),
            SkillKind::Fortify | SkillKind::Afflict | SkillKind::Poison | SkillKind::Link
                if self.status.is_none() =>
            {
                Err("timed skills need a status")
            }
            SkillKind::Link if self.targeting != TargetingMode::Pair => {
                Err("link needs pair targeting")
            }
            SkillKind::Cleanse if self.dispels.is_empty() => {
                Err("cleanse needs statuses to dispel")
            }
            SkillKind::Metamorph if self.class_shift.is_none() => {
                Err("metamorph needs a class to shift into")
            }
            _ => Ok(()),
        }
    }
}

//! Damage and hit-chance math.
//!
//! # Formula
//!
//! ```text
//! base     = power + attack_stat            (strength or intelligence)
//! scaled   = base * factor(type, armor) / 100
//! reduced  = scaled - defense / 2           (defense or magic defense)
//! critical = reduced * 3 / 2
//! weakened = value * 3 / 4                  (attacker is Weakened)
//! shielded = value / 2                      (target is Shielded)
//! final    = max(value, 1)
//! ```
//!
//! True damage skips the armor factor and the defense reduction.
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::character::StatKind;

/// Elemental or physical flavour of a damaging skill.
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
pub enum DamageType {
    Slash,
    Pierce,
    Blunt,
    Fire,
    Frost,
    Lightning,
    Arcane,
    /// Ignores armor and defense.
    Pure,
}

/// Which stats a damage type scales from and is reduced by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum School {
    Physical,
    Magical,
    True,
}

impl DamageType {
    pub const fn school(self) -> School {
        match self {
            DamageType::Slash | DamageType::Pierce | DamageType::Blunt => School::Physical,
            DamageType::Fire | DamageType::Frost | DamageType::Lightning | DamageType::Arcane => {
                School::Magical
            }
            DamageType::Pure => School::True,
        }
    }
}

impl School {
    /// Caller stat added to the skill's power.
    pub const fn attack_stat(self) -> StatKind {
        match self {
            School::Physical | School::True => StatKind::Strength,
            School::Magical => StatKind::Intelligence,
        }
    }

    /// Target stat that reduces incoming damage, if any.
    pub const fn defense_stat(self) -> Option<StatKind> {
        match self {
            School::Physical => Some(StatKind::Defense),
            School::Magical => Some(StatKind::MagicDefense),
            School::True => None,
        }
    }
}

/// Protection class of a character's armor (physical) or ward (magical).
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
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
pub enum ArmorType {
    #[default]
    Unarmored,
    Light,
    Medium,
    Heavy,
}

/// Damage multiplier in percent for a damage type against an armor type.
pub const fn armor_factor(damage: DamageType, armor: ArmorType) -> i32 {
    use ArmorType::*;
    use DamageType::*;

    match (damage, armor) {
        (Slash, Unarmored) => 125,
        (Slash, Heavy) => 75,
        (Pierce, Light) => 125,
        (Pierce, Heavy) => 90,
        (Blunt, Unarmored) => 90,
        (Blunt, Heavy) => 125,
        (Fire, Light) => 125,
        (Frost, Medium) => 125,
        (Lightning, Heavy) => 125,
        (Lightning, Unarmored) => 90,
        _ => 100,
    }
}

/// Everything [`compute_damage`] needs, gathered from caller, target and skill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageInput {
    pub damage_type: DamageType,
    pub power: i32,
    pub attack: i32,
    pub defense: i32,
    pub armor: ArmorType,
    pub critical: bool,
    pub weakened: bool,
    pub shielded: bool,
}

pub fn compute_damage(input: &DamageInput) -> i32 {
    let base = input.power + input.attack.max(0);

    let mut value = match input.damage_type.school() {
        School::True => base,
        _ => base * armor_factor(input.damage_type, input.armor) / 100 - input.defense.max(0) / 2,
    };

    if input.critical {
        value = value * 3 / 2;
    }
    if input.weakened {
        value = value * 3 / 4;
    }
    if input.shielded {
        value /= 2;
    }

    value.max(1)
}

/// Chance in percent that a skill lands, clamped to `5..=100`.
pub fn hit_chance(skill_accuracy: u8, accuracy: i32, evasion: i32) -> u32 {
    (i32::from(skill_accuracy) + accuracy - evasion).clamp(5, 100) as u32
}

//! Content records as they appear in the RON data files.
use std::collections::BTreeMap;
use std::fmt;

use duel_core::{ArmorType, CharacterId, ClassId, SkillId, StatKind};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u32);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team#{}", self.0)
    }
}

/// Base stats and default protection of a class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDefinition {
    pub id: ClassId,
    pub name: String,
    pub stats: BTreeMap<StatKind, i32>,
    #[serde(default)]
    pub armor: ArmorType,
    #[serde(default)]
    pub ward: ArmorType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSlot {
    Weapon,
    Armor,
    Accessory,
}

/// Equipment whose stats are added on top of the class base.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDefinition {
    pub id: ItemId,
    pub name: String,
    pub slot: ItemSlot,
    #[serde(default)]
    pub stats: BTreeMap<StatKind, i32>,
    /// Replaces the class armor while equipped.
    #[serde(default)]
    pub armor: Option<ArmorType>,
    /// Replaces the class ward while equipped.
    #[serde(default)]
    pub ward: Option<ArmorType>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterDefinition {
    pub id: CharacterId,
    pub name: String,
    pub class: ClassId,
    #[serde(default)]
    pub equipment: Vec<ItemId>,
    pub skills: Vec<SkillId>,
}

/// A character placed on its owner's half of the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub character: CharacterId,
    pub row: u8,
    pub column: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamDefinition {
    pub id: TeamId,
    pub name: String,
    pub owner: String,
    pub members: Vec<TeamMember>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub games_played: u32,
}

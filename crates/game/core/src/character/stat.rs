use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Identifier of a numeric character stat.
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
pub enum StatKind {
    Health,
    Mana,
    Ki,
    Strength,
    Intelligence,
    Defense,
    MagicDefense,
    Speed,
    Accuracy,
    Evasion,
}

/// Current value of a stat with an optional ceiling for heals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub value: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i32>,
}

impl Stat {
    pub const fn new(value: i32) -> Self {
        Self { value, max: None }
    }

    /// A resource that starts full and cannot be healed past `max`.
    pub const fn full(max: i32) -> Self {
        Self {
            value: max,
            max: Some(max),
        }
    }
}

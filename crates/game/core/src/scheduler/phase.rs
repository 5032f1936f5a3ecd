use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Named stage within a round at which scheduled callbacks fire.
///
/// Every round passes through all phases exactly once, in declaration order.
/// The orchestrator computes the turn order between [`Phase::BeforeOrder`] and
/// [`Phase::AfterOrder`].
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
pub enum Phase {
    BeforeOrder,
    AfterOrder,
    BeforeDamage,
    Damage,
    AfterDamage,
    EndOfRound,
}

impl Phase {
    pub const COUNT: usize = 6;

    /// Fixed per-round phase sequence.
    pub const SEQUENCE: [Phase; Phase::COUNT] = [
        Phase::BeforeOrder,
        Phase::AfterOrder,
        Phase::BeforeDamage,
        Phase::Damage,
        Phase::AfterDamage,
        Phase::EndOfRound,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Phase that follows this one within the same round.
    pub fn next(self) -> Option<Phase> {
        Self::SEQUENCE.get(self.index() + 1).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn sequence_matches_declaration_order() {
        let iterated: Vec<Phase> = Phase::iter().collect();
        assert_eq!(iterated, Phase::SEQUENCE.to_vec());
        assert_eq!(Phase::Damage.next(), Some(Phase::AfterDamage));
        assert_eq!(Phase::EndOfRound.next(), None);
    }

    #[test]
    fn names_are_snake_case() {
        assert_eq!(Phase::EndOfRound.to_string(), "end_of_round");
        assert_eq!("before_damage".parse::<Phase>(), Ok(Phase::BeforeDamage));
    }
}

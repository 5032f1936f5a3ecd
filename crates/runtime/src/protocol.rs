//! Messages exchanged with connected players.
//!
//! Both directions are internally tagged JSON objects, e.g.
//! `{"type":"login","username":"ada","password":"..."}`.
use duel_content::TeamId;
use duel_core::{
    CastId, Change, CharacterId, CommitFlags, Phase, Roster, Round, RoundReport, Side, SkillId,
};
use serde::{Deserialize, Serialize};

use crate::types::{RoomId, SeatedCharacter};

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Login { username: String, password: String },
    SelectTeam { team: TeamId },
    /// The player's actions for the current round, submitted once.
    Decision { actions: Vec<DecisionAction> },
}

/// One character's action for a round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionAction {
    pub caller: CharacterId,
    pub skill: SkillId,
    #[serde(default)]
    pub targets: Vec<CharacterId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        version: u32,
    },
    LoginSucceeded {
        username: String,
        games_played: u32,
    },
    LoginFailed {
        reason: String,
    },
    InvalidTeam {
        team: TeamId,
        reason: String,
    },
    ValidTeam {
        team: TeamId,
        name: String,
    },
    Queued,
    MatchFound {
        room: RoomId,
        side: Side,
        team: Vec<SeatedCharacter>,
    },
    RivalInfo {
        name: String,
        team: Vec<SeatedCharacter>,
    },
    DecisionPhaseStart {
        round: Round,
        timeout_ms: u64,
    },
    DecisionPhaseEnd {
        round: Round,
    },
    RoundResults {
        round: Round,
        entries: Vec<RoundEntry>,
    },
    Win {
        reason: FinishReason,
    },
    Lose {
        reason: FinishReason,
    },
    Draw,
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Every character on the losing side fell.
    Defeat,
    /// The losing player disconnected.
    Forfeit,
}

/// Whose cast a result entry belongs to, from the receiving player's view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Perspective {
    #[serde(rename = "self")]
    Own,
    #[serde(rename = "rival")]
    Rival,
}

/// One fired effect of the round as a player sees it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundEntry {
    pub actor: Perspective,
    pub cast: CastId,
    pub skill: SkillId,
    pub caller: CharacterId,
    pub phase: Phase,
    pub changes: Vec<Change>,
    pub flags: CommitFlags,
}

/// Turns a round's commit log into `viewer`'s results: casts whose caller or
/// targets died before acting are dropped and every actor is labelled as
/// the viewer's own or the rival's.
pub fn relabel(report: &RoundReport, roster: &Roster, viewer: Side) -> Vec<RoundEntry> {
    report
        .commits
        .iter()
        .filter(|commit| !commit.died_before_action())
        .filter_map(|commit| {
            let side = roster.get(commit.caller)?.side();
            Some(RoundEntry {
                actor: if side == viewer {
                    Perspective::Own
                } else {
                    Perspective::Rival
                },
                cast: commit.cast,
                skill: commit.skill,
                caller: commit.caller,
                phase: commit.phase,
                changes: commit.changes.clone(),
                flags: commit.flags,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use duel_core::{
        Battle, CharacterState, ClassId, DamageType, GridField, SkillBook, SkillDefinition,
        SkillKind, Slot, Stat, StatKind, TargetingMode,
    };

    use super::*;

    fn fighter(id: u32, side: Side, health: i32) -> CharacterState {
        CharacterState::new(CharacterId(id), format!("fighter {id}"), side, ClassId(1))
            .with_stat(StatKind::Health, Stat::full(health))
            .with_stat(StatKind::Speed, Stat::new(10 - id as i32))
    }

    fn battle(defender_health: i32) -> Battle {
        let roster = [
            fighter(1, Side::One, 50),
            fighter(2, Side::Two, 50),
            fighter(3, Side::Two, defender_health),
        ]
        .into_iter()
        .collect();
        let mut field = GridField::new(1, 2);
        field.place(CharacterId(1), Slot::new(Side::One, 0, 0)).unwrap();
        field.place(CharacterId(2), Slot::new(Side::Two, 0, 0)).unwrap();
        field.place(CharacterId(3), Slot::new(Side::Two, 0, 1)).unwrap();
        let book: SkillBook = [SkillDefinition::new(
            SkillId(1),
            "Jab",
            SkillKind::Strike,
            TargetingMode::Single,
        )
        .with_damage(DamageType::Pure, 5)]
        .into_iter()
        .collect();
        Battle::new(roster, field, Arc::new(book), 7)
    }

    #[test]
    fn entries_are_labelled_per_viewer() {
        let mut battle = battle(50);
        let first = battle.cast(CharacterId(1), &[CharacterId(2)], SkillId(1)).unwrap();
        let second = battle.cast(CharacterId(2), &[CharacterId(1)], SkillId(1)).unwrap();
        let report = battle.play_round(&[first, second]).unwrap();

        let one = relabel(&report, battle.roster(), Side::One);
        let two = relabel(&report, battle.roster(), Side::Two);
        assert_eq!(one.len(), 2);
        assert_eq!(one[0].actor, Perspective::Own);
        assert_eq!(one[1].actor, Perspective::Rival);
        assert_eq!(two[0].actor, Perspective::Rival);
        assert_eq!(two[1].actor, Perspective::Own);
        assert_eq!(one[0].changes, two[0].changes);
    }

    #[test]
    fn died_before_action_is_filtered() {
        let mut battle = battle(0);
        let dead = battle.cast(CharacterId(3), &[CharacterId(1)], SkillId(1)).unwrap();
        let report = battle.play_round(&[dead]).unwrap();

        assert_eq!(report.commits.len(), 1);
        assert!(relabel(&report, battle.roster(), Side::One).is_empty());
    }

    #[test]
    fn messages_use_tagged_json() {
        let json = r#"{"type":"decision","actions":[{"caller":1,"skill":2}]}"#;
        let message: ClientMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            message,
            ClientMessage::Decision {
                actions: vec![DecisionAction {
                    caller: CharacterId(1),
                    skill: SkillId(2),
                    targets: Vec::new(),
                }],
            }
        );

        let encoded = serde_json::to_string(&ServerMessage::Win {
            reason: FinishReason::Forfeit,
        })
        .unwrap();
        assert_eq!(encoded, r#"{"type":"win","reason":"forfeit"}"#);
    }
}

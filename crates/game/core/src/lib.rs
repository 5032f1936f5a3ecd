//! Deterministic turn-based combat core.
//!
//! `duel-core` holds the rules of a match and nothing else: no I/O, no async.
//! A [`Battle`] owns one room's [`Roster`], cast arena and [`RoundScheduler`];
//! skills register their effects through the scheduler and mutate characters
//! only while a phase runs, which keeps every round's commit log replayable.
pub mod battle;
pub mod character;
pub mod damage;
pub mod error;
pub mod field;
pub mod ids;
pub mod rng;
pub mod scheduler;
pub mod skill;

pub use battle::{Battle, CastSummary, Outcome, RoundReport};
pub use character::{
    CastRef, Change, ChangeKind, CharacterState, Grant, Roster, Stat, StatKind, StatusDelta,
    StatusEffect, StatusKind,
};
pub use damage::{ArmorType, DamageType, School};
pub use error::{Arity, CastError, EffectError, SchedulerError};
pub use field::{Field, GridField, PlacementError, Slot};
pub use ids::{CastId, CharacterId, ClassId, Round, Side, SkillId};
pub use rng::{Dice, PcgDice};
pub use scheduler::{
    Commit, CommitFlags, EffectFailure, Fired, Phase, PhaseReport, RoundScheduler, Token, TokenKind,
};
pub use skill::{
    Callback, CastContext, CastInfo, CastInstance, Cost, Effects, Hook, SkillBehavior, SkillBook,
    SkillDefinition, SkillKind, TargetingMode, Targets,
};

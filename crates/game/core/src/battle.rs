//! Per-room battle arena.
//!
//! [`Battle`] owns everything one match mutates: the roster, the cast arena
//! and a dedicated [`RoundScheduler`]. No two battles share state, so a room
//! can drive its battle without any locking.
use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::character::{Roster, StatKind};
use crate::error::{CastError, EffectError, SchedulerError};
use crate::field::Field;
use crate::ids::{CastId, CharacterId, Round, Side, SkillId};
use crate::rng::{Dice, PcgDice};
use crate::scheduler::{
    Commit, CommitFlags, EffectFailure, Fired, Phase, PhaseReport, RoundScheduler,
};
use crate::skill::{self, Callback, CastArena, CastContext, CastInstance, Effects, SkillBook};

/// How a battle ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    Winner { side: Side },
    /// Both sides fell in the same round.
    Draw,
}

/// One entry of a round's firing order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastSummary {
    pub cast: CastId,
    pub skill: SkillId,
    pub caller: CharacterId,
    pub side: Side,
    pub targets: Vec<CharacterId>,
}

/// Everything a round produced, read back before the round is finished.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    pub round: Round,
    pub order: Vec<CastSummary>,
    pub commits: Vec<Commit>,
    pub failures: Vec<EffectFailure>,
}

pub struct Battle {
    roster: Roster,
    field: Box<dyn Field>,
    book: Arc<SkillBook>,
    scheduler: RoundScheduler<Callback>,
    casts: CastArena,
    dice: PcgDice,
    seed: u64,
}

impl Battle {
    pub fn new(
        roster: Roster,
        field: impl Field + 'static,
        book: Arc<SkillBook>,
        seed: u64,
    ) -> Self {
        Self {
            roster,
            field: Box::new(field),
            book,
            scheduler: RoundScheduler::new(),
            casts: CastArena::new(),
            dice: PcgDice,
            seed,
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn field(&self) -> &dyn Field {
        self.field.as_ref()
    }

    pub fn book(&self) -> &SkillBook {
        &self.book
    }

    pub fn scheduler(&self) -> &RoundScheduler<Callback> {
        &self.scheduler
    }

    pub fn current_round(&self) -> Round {
        self.scheduler.current_round()
    }

    /// Commit log of the current round, in firing order.
    pub fn changes(&self) -> &[Commit] {
        self.scheduler.changes()
    }

    pub fn failures(&self) -> &[EffectFailure] {
        self.scheduler.failures()
    }

    pub fn cast_instance(&self, id: CastId) -> Option<&CastInstance> {
        self.casts.get(id)
    }

    /// Validates a decision and stores the resulting cast.
    ///
    /// The caller and every selected character must be in the roster, and a
    /// caller with a skill list must have learned the skill.
    pub fn cast(
        &mut self,
        caller: CharacterId,
        selection: &[CharacterId],
        skill: SkillId,
    ) -> Result<CastId, CastError> {
        let character = self.roster.get(caller).ok_or(CastError::UnknownCaller(caller))?;
        if let Some(unknown) = selection.iter().find(|id| !self.roster.contains(**id)) {
            return Err(CastError::UnknownTarget(*unknown));
        }
        if !self.book.contains(skill) {
            return Err(CastError::UnknownSkill(skill));
        }
        if !character.skills().is_empty() && !character.skills().contains(&skill) {
            return Err(CastError::SkillNotLearned { caller, skill });
        }

        let id = self.casts.next_id();
        let instance = skill::cast(&self.book, self.field.as_ref(), id, caller, selection, skill)?;
        debug!(
            target: "duel::battle",
            cast = %id,
            %skill,
            %caller,
            targets = instance.targets().len(),
            "cast created"
        );
        self.casts.insert(instance);
        Ok(id)
    }

    /// Firing order: descending caller speed. Equal speeds keep the order
    /// the casts were given in.
    pub fn turn_order(&self, casts: &[CastId]) -> Vec<CastId> {
        let mut order: Vec<CastId> = casts
            .iter()
            .copied()
            .filter(|id| self.casts.get(*id).is_some())
            .collect();
        order.sort_by_key(|id| {
            let speed = self
                .casts
                .get(*id)
                .and_then(|instance| self.roster.get(instance.caller()))
                .map_or(0, |caller| caller.stat(StatKind::Speed));
            Reverse(speed)
        });
        order
    }

    /// Runs a cast's `init`. A caller that is already dead gets a
    /// died-before-action commit instead.
    pub fn init_cast(&mut self, id: CastId) -> Result<(), EffectError> {
        let Battle {
            roster,
            scheduler,
            casts,
            ..
        } = self;

        let instance = casts.get_mut(id).ok_or(EffectError::UnknownCast(id))?;
        let info = instance.info().clone();

        if !roster.is_alive(info.caller) {
            let phase = scheduler.next_phase().unwrap_or(Phase::EndOfRound);
            scheduler.record(Commit {
                cast: id,
                skill: info.skill(),
                caller: info.caller,
                phase,
                changes: Vec::new(),
                flags: CommitFlags::DIED_BEFORE_ACTION,
            });
            return Ok(());
        }

        let mut behavior = instance.take_behavior().ok_or(EffectError::Reentrant(id))?;
        let result = behavior.init(&mut CastContext::new(&info, roster, scheduler));
        if let Some(instance) = casts.get_mut(id) {
            instance.restore_behavior(behavior);
        }
        result
    }

    /// Fires every callback due at `phase` of the current round.
    pub fn run_phase(&mut self, phase: Phase) -> Result<PhaseReport, SchedulerError> {
        let Battle {
            roster,
            scheduler,
            casts,
            dice,
            seed,
            ..
        } = self;
        let seed = *seed;
        let dice: &dyn Dice = &*dice;

        scheduler.run_phase(phase, |scheduler, fired| {
            fire(roster, scheduler, casts, dice, seed, fired)
        })
    }

    /// Runs a full round for `casts`: before-order, ordering and init, then
    /// every remaining phase. The round stays open so the caller can read the
    /// report and check the outcome before [`Self::finish_round`].
    pub fn play_round(&mut self, casts: &[CastId]) -> Result<RoundReport, SchedulerError> {
        let round = self.current_round();
        self.run_phase(Phase::BeforeOrder)?;

        let order = self.turn_order(casts);
        for id in &order {
            if let Err(error) = self.init_cast(*id) {
                self.scheduler
                    .report_failure(Phase::AfterOrder, format!("{id}: {error}"));
            }
        }

        for phase in &Phase::SEQUENCE[1..] {
            self.run_phase(*phase)?;
        }

        let order = order.iter().filter_map(|id| self.summary(*id)).collect();
        debug!(
            target: "duel::battle",
            %round,
            commits = self.changes().len(),
            failures = self.failures().len(),
            "round resolved"
        );

        Ok(RoundReport {
            round,
            order,
            commits: self.changes().to_vec(),
            failures: self.failures().to_vec(),
        })
    }

    /// Advances to the next round and drops every cast that has no callback
    /// left and owns no status.
    pub fn finish_round(&mut self) -> Result<Round, SchedulerError> {
        let round = self.scheduler.finish_round()?;

        let owners = self
            .roster
            .iter()
            .flat_map(|character| character.statuses().values());
        let live: BTreeSet<CastId> = self
            .scheduler
            .live_tasks()
            .map(|callback| callback.cast)
            .chain(owners.map(|effect| effect.owner))
            .collect();
        let before = self.casts.len();
        self.casts.retain(|id| live.contains(&id));
        debug!(
            target: "duel::battle",
            %round,
            pruned = before - self.casts.len(),
            live = self.casts.len(),
            "round finished"
        );
        Ok(round)
    }

    pub fn defeated(&self, side: Side) -> bool {
        self.roster.defeated(side)
    }

    /// `None` while both sides still have someone standing.
    pub fn outcome(&self) -> Option<Outcome> {
        match (self.defeated(Side::One), self.defeated(Side::Two)) {
            (true, true) => Some(Outcome::Draw),
            (true, false) => Some(Outcome::Winner { side: Side::Two }),
            (false, true) => Some(Outcome::Winner { side: Side::One }),
            (false, false) => None,
        }
    }

    fn summary(&self, id: CastId) -> Option<CastSummary> {
        let instance = self.casts.get(id)?;
        let side = self.roster.get(instance.caller())?.side();
        Some(CastSummary {
            cast: id,
            skill: instance.definition().id,
            caller: instance.caller(),
            side,
            targets: instance.targets().as_slice().to_vec(),
        })
    }
}

impl std::fmt::Debug for Battle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Battle")
            .field("round", &self.current_round())
            .field("characters", &self.roster.len())
            .field("casts", &self.casts.len())
            .finish()
    }
}

/// Runs one scheduled callback and records its commit, even when it fails
/// halfway, so every applied change is logged.
fn fire(
    roster: &mut Roster,
    scheduler: &mut RoundScheduler<Callback>,
    casts: &mut CastArena,
    dice: &dyn Dice,
    seed: u64,
    fired: Fired<Callback>,
) -> Result<(), EffectError> {
    let Callback { cast, hook } = fired.task;
    let instance = casts.get_mut(cast).ok_or(EffectError::UnknownCast(cast))?;
    let mut behavior = instance.take_behavior().ok_or(EffectError::Reentrant(cast))?;
    let info = instance.info().clone();

    let (result, changes, flags) = {
        let mut fx = Effects::new(info.clone(), hook, roster, scheduler, casts, dice, seed);
        let result = behavior.fire(hook, &mut fx);
        let (changes, flags) = fx.into_commit();
        (result, changes, flags)
    };

    if let Some(instance) = casts.get_mut(cast) {
        instance.restore_behavior(behavior);
    }
    scheduler.record(Commit {
        cast,
        skill: info.skill(),
        caller: info.caller,
        phase: fired.phase,
        changes,
        flags,
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{ChangeKind, CharacterState, Stat, StatusDelta, StatusKind};
    use crate::damage::DamageType;
    use crate::field::{GridField, Slot};
    use crate::ids::ClassId;
    use crate::skill::{SkillDefinition, SkillKind, TargetingMode};

    const A: CharacterId = CharacterId(1);
    const B: CharacterId = CharacterId(2);
    const C: CharacterId = CharacterId(3);
    const D: CharacterId = CharacterId(4);

    const SLASH: SkillId = SkillId(1);
    const GUARD: SkillId = SkillId(2);
    const VENOM: SkillId = SkillId(3);
    const BOND: SkillId = SkillId(4);
    const PURIFY: SkillId = SkillId(5);
    const STUN: SkillId = SkillId(6);
    const ROAR: SkillId = SkillId(7);
    const SIPHON: SkillId = SkillId(8);
    const FOCUS: SkillId = SkillId(9);
    const SHIFT: SkillId = SkillId(10);
    const LONG_STUN: SkillId = SkillId(11);
    const LONG_BOND: SkillId = SkillId(12);
    const OATH: SkillId = SkillId(13);

    fn book() -> SkillBook {
        [
            SkillDefinition::new(SLASH, "Slash", SkillKind::Strike, TargetingMode::Single)
                .with_damage(DamageType::Slash, 10)
                .blocked_by([StatusKind::Stunned]),
            SkillDefinition::new(GUARD, "Guard", SkillKind::Afflict, TargetingMode::Single)
                .with_status(StatusKind::Shielded, 2),
            SkillDefinition::new(VENOM, "Venom", SkillKind::Poison, TargetingMode::Single)
                .with_status(StatusKind::Poisoned, 3)
                .with_power(4),
            SkillDefinition::new(BOND, "Bond", SkillKind::Link, TargetingMode::Pair)
                .with_status(StatusKind::Linked, 2),
            SkillDefinition::new(PURIFY, "Purify", SkillKind::Cleanse, TargetingMode::Single)
                .dispelling([StatusKind::Poisoned, StatusKind::Fortified, StatusKind::Linked]),
            SkillDefinition::new(STUN, "Stun", SkillKind::Afflict, TargetingMode::Single)
                .with_status(StatusKind::Stunned, 1),
            SkillDefinition::new(ROAR, "Roar", SkillKind::Fortify, TargetingMode::Single)
                .with_status(StatusKind::Fortified, 3)
                .with_stat(StatKind::Strength)
                .with_power(6),
            SkillDefinition::new(SIPHON, "Siphon", SkillKind::Drain, TargetingMode::Single)
                .with_damage(DamageType::Pure, 20)
                .with_cost(StatKind::Mana, 5),
            SkillDefinition::new(FOCUS, "Focus", SkillKind::Fortify, TargetingMode::Single)
                .with_status(StatusKind::Fortified, 1)
                .with_stat(StatKind::Strength)
                .with_power(2),
            SkillDefinition::new(SHIFT, "Shift", SkillKind::Metamorph, TargetingMode::Single)
                .with_status(StatusKind::Morphed, 1)
                .morphing_into(ClassId(9)),
            SkillDefinition::new(LONG_STUN, "Long stun", SkillKind::Afflict, TargetingMode::Single)
                .with_status(StatusKind::Stunned, 3),
            SkillDefinition::new(LONG_BOND, "Long bond", SkillKind::Link, TargetingMode::Pair)
                .with_status(StatusKind::Linked, 3),
            SkillDefinition::new(OATH, "Oath", SkillKind::Link, TargetingMode::Pair)
                .with_status(StatusKind::Linked, 4),
        ]
        .into_iter()
        .collect()
    }

    fn fighter(id: CharacterId, side: Side, speed: i32) -> CharacterState {
        CharacterState::new(id, format!("fighter {}", id.0), side, ClassId(1))
            .with_stat(StatKind::Health, Stat::full(100))
            .with_stat(StatKind::Mana, Stat::full(10))
            .with_stat(StatKind::Strength, Stat::new(10))
            .with_stat(StatKind::Defense, Stat::new(10))
            .with_stat(StatKind::Speed, Stat::new(speed))
    }

    fn battle() -> Battle {
        let roster: Roster = [
            fighter(A, Side::One, 10),
            fighter(C, Side::One, 5),
            fighter(B, Side::Two, 10),
        ]
        .into_iter()
        .collect();
        let mut field = GridField::new(1, 2);
        field.place(A, Slot::new(Side::One, 0, 0)).unwrap();
        field.place(C, Slot::new(Side::One, 0, 1)).unwrap();
        field.place(B, Slot::new(Side::Two, 0, 0)).unwrap();
        Battle::new(roster, field, Arc::new(book()), 42)
    }

    fn round(battle: &mut Battle, casts: &[CastId]) -> RoundReport {
        let report = battle.play_round(casts).unwrap();
        battle.finish_round().unwrap();
        report
    }

    fn commits_of(report: &RoundReport, cast: CastId) -> Vec<&Commit> {
        report.commits.iter().filter(|commit| commit.cast == cast).collect()
    }

    #[test]
    fn damage_only_skill_commits_one_negative_health_change() {
        let mut battle = battle();
        let slash = battle.cast(A, &[B], SLASH).unwrap();
        let report = battle.play_round(&[slash]).unwrap();

        assert_eq!(report.commits.len(), 1);
        let commit = &report.commits[0];
        assert_eq!(commit.cast, slash);
        assert_eq!(commit.phase, Phase::Damage);
        assert_eq!(commit.changes.len(), 1);

        let change = commit.changes[0];
        assert_eq!(change.character(), B);
        match change.kind() {
            ChangeKind::Stat { stat, delta } => {
                assert_eq!(stat, StatKind::Health);
                assert!(delta < 0);
            }
            other => panic!("unexpected change {other:?}"),
        }
        assert_eq!(battle.changes(), report.commits.as_slice());
    }

    #[test]
    fn two_round_status_expires_at_second_end_of_round() {
        let mut battle = battle();
        let guard = battle.cast(A, &[A], GUARD).unwrap();

        let first = round(&mut battle, &[guard]);
        assert!(battle.roster().get(A).unwrap().has_status(StatusKind::Shielded));
        assert_eq!(
            first.commits[0].changes[0].kind(),
            ChangeKind::Status {
                status: StatusKind::Shielded,
                delta: StatusDelta::Applied
            }
        );

        let second = round(&mut battle, &[]);
        assert!(!battle.roster().get(A).unwrap().has_status(StatusKind::Shielded));
        let expiry = commits_of(&second, guard);
        assert_eq!(expiry.len(), 1);
        assert_eq!(expiry[0].phase, Phase::EndOfRound);
        assert_eq!(
            expiry[0].changes[0].kind(),
            ChangeKind::Status {
                status: StatusKind::Shielded,
                delta: StatusDelta::Removed
            }
        );
    }

    #[test]
    fn blocked_caller_commits_flag_without_changes() {
        let mut battle = battle();
        let stun = battle.cast(B, &[A], STUN).unwrap();
        let slash = battle.cast(A, &[B], SLASH).unwrap();

        // B and A share speed, so B acts first because it was listed first.
        let report = round(&mut battle, &[stun, slash]);
        assert_eq!(report.order[0].cast, stun);

        let blocked = commits_of(&report, slash);
        assert!(blocked[0].flags.contains(CommitFlags::BLOCKED));
        assert!(blocked[0].changes.is_empty());
        assert_eq!(battle.roster().get(B).unwrap().stat(StatKind::Health), 100);
    }

    #[test]
    fn poison_ticks_every_round_until_it_expires() {
        let mut battle = battle();
        let venom = battle.cast(A, &[B], VENOM).unwrap();

        round(&mut battle, &[venom]);
        round(&mut battle, &[]);
        round(&mut battle, &[]);
        round(&mut battle, &[]);

        let target = battle.roster().get(B).unwrap();
        assert_eq!(target.stat(StatKind::Health), 100 - 3 * 4);
        assert!(!target.has_status(StatusKind::Poisoned));
        assert_eq!(battle.scheduler().pending_count(), 0);
    }

    #[test]
    fn cleanse_cancels_poison_ticks() {
        let mut battle = battle();
        let venom = battle.cast(A, &[B], VENOM).unwrap();
        round(&mut battle, &[venom]);

        let purify = battle.cast(B, &[B], PURIFY).unwrap();
        let report = round(&mut battle, &[purify]);
        assert!(
            commits_of(&report, venom).is_empty(),
            "tick must not fire after the poison was purged"
        );

        round(&mut battle, &[]);
        assert_eq!(battle.roster().get(B).unwrap().stat(StatKind::Health), 96);
        assert_eq!(battle.scheduler().pending_count(), 0);
    }

    #[test]
    fn fortify_reverts_exactly_on_expiry_and_on_purge() {
        let mut battle = battle();
        let roar = battle.cast(A, &[A], ROAR).unwrap();
        round(&mut battle, &[roar]);
        assert_eq!(battle.roster().get(A).unwrap().stat(StatKind::Strength), 16);

        let purify = battle.cast(C, &[A], PURIFY).unwrap();
        let report = round(&mut battle, &[purify]);
        assert_eq!(battle.roster().get(A).unwrap().stat(StatKind::Strength), 10);
        assert!(!battle.roster().get(A).unwrap().has_status(StatusKind::Fortified));
        // the purge and the revert land in the purifier's commit
        assert_eq!(commits_of(&report, purify)[0].changes.len(), 2);

        round(&mut battle, &[]);
        assert_eq!(battle.roster().get(A).unwrap().stat(StatKind::Strength), 10);
        assert_eq!(battle.scheduler().pending_count(), 0);
    }

    #[test]
    fn stronger_status_cancels_the_weaker_owner() {
        let mut battle = battle();
        let focus = battle.cast(A, &[A], FOCUS).unwrap();
        let roar = battle.cast(C, &[A], ROAR).unwrap();
        round(&mut battle, &[focus, roar]);

        // Focus was displaced and reverted; only Roar's bonus remains.
        let knight = battle.roster().get(A).unwrap();
        assert_eq!(knight.stat(StatKind::Strength), 16);
        assert_eq!(
            knight.status(StatusKind::Fortified).map(|effect| effect.owner),
            Some(roar)
        );
    }

    #[test]
    fn link_rolls_back_when_one_side_rejects() {
        let mut battle = battle();
        let bond = battle.cast(A, &[A, B], BOND).unwrap();
        let rival_bond = battle.cast(B, &[B, C], BOND).unwrap();

        // Same expiry: B keeps the first link, so the second one never lands.
        let report = battle.play_round(&[bond, rival_bond]).unwrap();
        let rejected = commits_of(&report, rival_bond);
        assert!(rejected[0].flags.contains(CommitFlags::REJECTED));
        assert!(rejected[0].changes.is_empty());
        assert!(!battle.roster().get(C).unwrap().has_status(StatusKind::Linked));
        assert_eq!(
            battle.roster().get(B).unwrap().status(StatusKind::Linked).map(|effect| effect.owner),
            Some(bond)
        );
    }

    #[test]
    fn rejected_link_leaves_displaceable_links_intact() {
        let roster: Roster = [
            fighter(A, Side::One, 10),
            fighter(C, Side::One, 5),
            fighter(B, Side::Two, 10),
            fighter(D, Side::Two, 5),
        ]
        .into_iter()
        .collect();
        let mut field = GridField::new(1, 2);
        field.place(A, Slot::new(Side::One, 0, 0)).unwrap();
        field.place(C, Slot::new(Side::One, 0, 1)).unwrap();
        field.place(B, Slot::new(Side::Two, 0, 0)).unwrap();
        field.place(D, Slot::new(Side::Two, 0, 1)).unwrap();
        let mut battle = Battle::new(roster, field, Arc::new(book()), 7);

        // A-C holds until the end of round 2, B-D until the end of round 3.
        let weak = battle.cast(A, &[A, C], LONG_BOND).unwrap();
        let strong = battle.cast(B, &[B, D], OATH).unwrap();
        round(&mut battle, &[weak, strong]);

        // A would take the new link, B would not: nothing may change.
        let bond = battle.cast(A, &[A, B], LONG_BOND).unwrap();
        let report = battle.play_round(&[bond]).unwrap();

        let rejected = commits_of(&report, bond);
        assert!(rejected[0].flags.contains(CommitFlags::REJECTED));
        assert!(rejected[0].changes.is_empty());
        assert!(commits_of(&report, weak).is_empty());

        let owner = |id: CharacterId| {
            battle
                .roster()
                .get(id)
                .and_then(|character| character.status(StatusKind::Linked))
                .map(|effect| effect.owner)
        };
        assert_eq!(owner(A), Some(weak));
        assert_eq!(owner(C), Some(weak));
        assert_eq!(owner(B), Some(strong));
        assert_eq!(owner(D), Some(strong));
    }

    #[test]
    fn finished_casts_are_pruned() {
        let mut battle = battle();
        let slash = battle.cast(A, &[B], SLASH).unwrap();
        let venom = battle.cast(C, &[B], VENOM).unwrap();
        round(&mut battle, &[slash, venom]);

        assert!(battle.cast_instance(slash).is_none());
        assert!(battle.cast_instance(venom).is_some());

        round(&mut battle, &[]);
        round(&mut battle, &[]);
        round(&mut battle, &[]);
        assert!(battle.cast_instance(venom).is_none());
        assert_eq!(battle.scheduler().pending_count(), 0);

        // Ids keep counting after pruning.
        let next = battle.cast(A, &[B], SLASH).unwrap();
        assert!(next > venom);
    }

    #[test]
    fn purging_one_end_of_a_link_breaks_both() {
        let mut battle = battle();
        let bond = battle.cast(A, &[A, B], BOND).unwrap();
        round(&mut battle, &[bond]);

        let purify = battle.cast(C, &[A], PURIFY).unwrap();
        round(&mut battle, &[purify]);
        assert!(!battle.roster().get(A).unwrap().has_status(StatusKind::Linked));
        assert!(!battle.roster().get(B).unwrap().has_status(StatusKind::Linked));
        assert_eq!(battle.scheduler().pending_count(), 0);
    }

    #[test]
    fn drain_pays_cost_and_heals_half() {
        let mut battle = battle();
        let slash = battle.cast(B, &[A], SLASH).unwrap();
        round(&mut battle, &[slash]);
        let wounded = battle.roster().get(A).unwrap().stat(StatKind::Health);

        let siphon = battle.cast(A, &[B], SIPHON).unwrap();
        round(&mut battle, &[siphon]);

        let caster = battle.roster().get(A).unwrap();
        assert_eq!(caster.stat(StatKind::Mana), 5);
        assert_eq!(caster.stat(StatKind::Health), (wounded + 15).min(100));
        assert_eq!(battle.roster().get(B).unwrap().stat(StatKind::Health), 70);

        let again = battle.cast(A, &[B], SIPHON).unwrap();
        round(&mut battle, &[again]);
        let broke = battle.cast(A, &[B], SIPHON).unwrap();
        let report = round(&mut battle, &[broke]);
        assert!(commits_of(&report, broke)[0].flags.contains(CommitFlags::EXHAUSTED));
    }

    #[test]
    fn metamorph_restores_class() {
        let mut battle = battle();
        let shift = battle.cast(A, &[A], SHIFT).unwrap();
        battle.play_round(&[shift]).unwrap();
        // expiry already ran at this round's end
        assert_eq!(battle.roster().get(A).unwrap().class(), ClassId(1));

        let classes: Vec<ChangeKind> = battle
            .changes()
            .iter()
            .flat_map(|commit| commit.changes.iter().map(|change| change.kind()))
            .filter(|kind| matches!(kind, ChangeKind::Class { .. }))
            .collect();
        assert_eq!(
            classes,
            vec![
                ChangeKind::Class { class: ClassId(9) },
                ChangeKind::Class { class: ClassId(1) },
            ]
        );
    }

    #[test]
    fn dead_caller_is_marked_died_before_action() {
        let mut battle = battle();
        let slashes: Vec<CastId> = (0..10).map(|_| battle.cast(A, &[B], SLASH).unwrap()).collect();
        round(&mut battle, &slashes);
        assert!(battle.defeated(Side::Two));
        assert_eq!(battle.outcome(), Some(Outcome::Winner { side: Side::One }));

        let late = battle.cast(B, &[A], SLASH).unwrap();
        let report = round(&mut battle, &[late]);
        assert!(report.commits[0].died_before_action());
    }

    #[test]
    fn invalid_casts_never_reach_the_timeline() {
        let mut battle = battle();
        assert_eq!(battle.cast(A, &[B], SkillId(99)), Err(CastError::UnknownSkill(SkillId(99))));
        assert_eq!(
            battle.cast(CharacterId(50), &[B], SLASH),
            Err(CastError::UnknownCaller(CharacterId(50)))
        );
        assert!(matches!(battle.cast(A, &[B, C], SLASH), Err(CastError::TargetArity { .. })));
        assert_eq!(battle.cast_instance(CastId(0)).map(|cast| cast.id()), None);
    }

    #[test]
    fn skill_list_restricts_casts() {
        let roster: Roster = [
            fighter(A, Side::One, 1).with_skills([SLASH]),
            fighter(B, Side::Two, 1),
        ]
        .into_iter()
        .collect();
        let mut field = GridField::new(1, 1);
        field.place(A, Slot::new(Side::One, 0, 0)).unwrap();
        field.place(B, Slot::new(Side::Two, 0, 0)).unwrap();
        let mut battle = Battle::new(roster, field, Arc::new(book()), 1);

        assert!(battle.cast(A, &[B], SLASH).is_ok());
        assert_eq!(
            battle.cast(A, &[B], STUN),
            Err(CastError::SkillNotLearned { caller: A, skill: STUN })
        );
    }

    #[test]
    fn turn_order_is_by_speed_then_submission() {
        let mut battle = battle();
        let slow = battle.cast(C, &[B], SLASH).unwrap();
        let fast_one = battle.cast(A, &[B], SLASH).unwrap();
        let fast_two = battle.cast(B, &[A], SLASH).unwrap();

        assert_eq!(battle.turn_order(&[slow, fast_two, fast_one]), vec![fast_two, fast_one, slow]);
    }

    #[test]
    fn stronger_stun_survives_weaker_one() {
        let mut battle = battle();
        let long = battle.cast(B, &[A], LONG_STUN).unwrap();
        let short = battle.cast(C, &[A], STUN).unwrap();
        round(&mut battle, &[long, short]);
        round(&mut battle, &[]);
        let effect = battle.roster().get(A).unwrap().status(StatusKind::Stunned).copied();
        assert_eq!(effect.map(|effect| effect.owner), Some(long));
    }

    #[test]
    fn draw_when_both_sides_fall() {
        let roster: Roster = [
            fighter(A, Side::One, 1).with_stat(StatKind::Health, Stat::new(0)),
            fighter(B, Side::Two, 1).with_stat(StatKind::Health, Stat::new(0)),
        ]
        .into_iter()
        .collect();
        let battle = Battle::new(roster, GridField::new(1, 1), Arc::new(book()), 1);
        assert_eq!(battle.outcome(), Some(Outcome::Draw));
    }
}

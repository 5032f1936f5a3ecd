//! The seam between skill rules and the battle.
//!
//! [`CastContext`] is handed to `init` and can only read characters and
//! schedule callbacks. [`Effects`] is handed to fired callbacks and is the only
//! way skill code mutates characters; it collects the resulting changes for
//! the commit log in the order they happened.
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::character::{
    CastRef, Change, CharacterState, Grant, Roster, StatKind, StatusEffect, StatusKind,
};
use crate::damage::{self, DamageInput};
use crate::error::{EffectError, SchedulerError};
use crate::ids::{CastId, CharacterId, ClassId, Round};
use crate::rng::{self, Dice};
use crate::scheduler::{CommitFlags, Phase, RoundScheduler, Token};
use crate::skill::{CastArena, CastInfo, SkillDefinition};

/// Which of a cast's callbacks a scheduled entry invokes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hook {
    /// The skill's main effect.
    Resolve,
    /// Recurring effect while a status holds.
    Tick,
    /// End of a timed effect.
    Expire,
}

impl Hook {
    const fn index(self) -> u32 {
        match self {
            Hook::Resolve => 0,
            Hook::Tick => 1,
            Hook::Expire => 2,
        }
    }
}

/// Task payload stored in the battle's scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Callback {
    pub cast: CastId,
    pub hook: Hook,
}

/// Per-cast rule code.
///
/// One value is created per cast, so implementations keep whatever they need
/// to undo their effects later (tokens, applied deltas, affected targets).
pub trait SkillBehavior: Send + Sync + fmt::Debug {
    /// Registers the cast's effects. Must not mutate characters.
    fn init(&mut self, ctx: &mut CastContext<'_>) -> Result<(), EffectError> {
        ctx.schedule_now(Hook::Resolve)?;
        Ok(())
    }

    fn fire(&mut self, hook: Hook, fx: &mut Effects<'_>) -> Result<(), EffectError>;

    /// Called when another effect removed statuses in `reasons` from `target`
    /// that this cast may maintain. Returns whether anything was undone.
    fn cancel(
        &mut self,
        _target: CharacterId,
        _reasons: &[StatusKind],
        _fx: &mut Effects<'_>,
    ) -> Result<bool, EffectError> {
        Ok(false)
    }
}

/// Read-only view plus scheduling, given to [`SkillBehavior::init`].
pub struct CastContext<'a> {
    info: &'a CastInfo,
    roster: &'a Roster,
    scheduler: &'a mut RoundScheduler<Callback>,
}

impl<'a> CastContext<'a> {
    pub(crate) fn new(
        info: &'a CastInfo,
        roster: &'a Roster,
        scheduler: &'a mut RoundScheduler<Callback>,
    ) -> Self {
        Self {
            info,
            roster,
            scheduler,
        }
    }

    pub fn info(&self) -> &CastInfo {
        self.info
    }

    pub fn roster(&self) -> &Roster {
        self.roster
    }

    pub fn current_round(&self) -> Round {
        self.scheduler.current_round()
    }

    /// Schedules `hook` for this round's damage phase.
    pub fn schedule_now(&mut self, hook: Hook) -> Result<Token, SchedulerError> {
        let callback = self.callback(hook);
        self.scheduler.schedule_now(Phase::Damage, callback)
    }

    pub fn schedule_in(
        &mut self,
        rounds: u32,
        phase: Phase,
        hook: Hook,
    ) -> Result<Token, SchedulerError> {
        let callback = self.callback(hook);
        self.scheduler.schedule_in(rounds, phase, callback)
    }

    pub fn register_each(&mut self, phase: Phase, hook: Hook) -> Token {
        let callback = self.callback(hook);
        self.scheduler.register_each(phase, callback)
    }

    fn callback(&self, hook: Hook) -> Callback {
        Callback {
            cast: self.info.id,
            hook,
        }
    }
}

/// Mutation handle given to fired callbacks.
pub struct Effects<'a> {
    info: CastInfo,
    roster: &'a mut Roster,
    scheduler: &'a mut RoundScheduler<Callback>,
    casts: &'a mut CastArena,
    dice: &'a dyn Dice,
    seed: u64,
    context: u32,
    rolls: u32,
    changes: Vec<Change>,
    flags: CommitFlags,
}

/// Roll context used by cancellations, which never share a firing's rolls.
const CANCEL_CONTEXT: u32 = 1 << 20;

impl<'a> Effects<'a> {
    pub(crate) fn new(
        info: CastInfo,
        hook: Hook,
        roster: &'a mut Roster,
        scheduler: &'a mut RoundScheduler<Callback>,
        casts: &'a mut CastArena,
        dice: &'a dyn Dice,
        seed: u64,
    ) -> Self {
        Self {
            info,
            roster,
            scheduler,
            casts,
            dice,
            seed,
            context: hook.index() << 8,
            rolls: 0,
            changes: Vec::new(),
            flags: CommitFlags::empty(),
        }
    }

    pub(crate) fn into_commit(self) -> (Vec<Change>, CommitFlags) {
        (self.changes, self.flags)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn info(&self) -> &CastInfo {
        &self.info
    }

    pub fn definition(&self) -> &SkillDefinition {
        &self.info.definition
    }

    pub fn caller(&self) -> CharacterId {
        self.info.caller
    }

    pub fn targets(&self) -> Vec<CharacterId> {
        self.info.targets.as_slice().to_vec()
    }

    pub fn current_round(&self) -> Round {
        self.scheduler.current_round()
    }

    pub fn roster(&self) -> &Roster {
        self.roster
    }

    pub fn character(&self, id: CharacterId) -> Result<&CharacterState, EffectError> {
        self.roster.get(id).ok_or(EffectError::UnknownCharacter(id))
    }

    pub fn is_alive(&self, id: CharacterId) -> bool {
        self.roster.is_alive(id)
    }

    pub fn flags(&self) -> CommitFlags {
        self.flags
    }

    pub fn flag(&mut self, flags: CommitFlags) {
        self.flags |= flags;
    }

    // ------------------------------------------------------------------
    // Scheduling
    // ------------------------------------------------------------------

    pub fn schedule_in(
        &mut self,
        rounds: u32,
        phase: Phase,
        hook: Hook,
    ) -> Result<Token, SchedulerError> {
        let callback = Callback {
            cast: self.info.id,
            hook,
        };
        self.scheduler.schedule_in(rounds, phase, callback)
    }

    pub fn register_each(&mut self, phase: Phase, hook: Hook) -> Token {
        let callback = Callback {
            cast: self.info.id,
            hook,
        };
        self.scheduler.register_each(phase, callback)
    }

    /// Cancels a one-shot token; spent tokens are logged and ignored.
    pub fn cancel(&mut self, token: Token) -> Result<(), SchedulerError> {
        let result = self.scheduler.cancel(token);
        self.release(result)
    }

    /// Unregisters a recurring token; spent tokens are logged and ignored.
    pub fn unregister(&mut self, token: Token) -> Result<(), SchedulerError> {
        let result = self.scheduler.unregister_each(token);
        self.release(result)
    }

    fn release(&self, result: Result<(), SchedulerError>) -> Result<(), SchedulerError> {
        match result {
            Err(error) if error.is_stale_token() => {
                debug!(target: "duel::battle", cast = %self.info.id, %error, "ignored stale token");
                Ok(())
            }
            other => other,
        }
    }

    /// Rounds ahead and expiry round for a status lasting `duration` rounds,
    /// counting the current one.
    pub fn expiry(&self, duration: u32) -> (u32, Round) {
        let ahead = duration.max(1) - 1;
        (ahead, self.current_round() + ahead)
    }

    // ------------------------------------------------------------------
    // Dice and damage
    // ------------------------------------------------------------------

    fn roll(&mut self) -> u32 {
        let salt = self.context + self.rolls;
        let seed = rng::roll_seed(self.seed, self.current_round(), self.info.id, salt);
        self.rolls += 1;
        self.dice.roll_d100(seed)
    }

    /// Rolls the skill's accuracy against `target`. Sets MISSED on a miss.
    pub fn roll_hit(&mut self, target: CharacterId) -> Result<bool, EffectError> {
        let chance = damage::hit_chance(
            self.definition().accuracy,
            self.character(self.caller())?.stat(StatKind::Accuracy),
            self.character(target)?.stat(StatKind::Evasion),
        );
        let hit = self.roll() <= chance;
        if !hit {
            self.flag(CommitFlags::MISSED);
        }
        Ok(hit)
    }

    /// Rolls the skill's critical chance. Sets CRITICAL on success.
    pub fn roll_critical(&mut self) -> bool {
        let chance = u32::from(self.definition().critical);
        if chance == 0 {
            return false;
        }
        let critical = self.roll() <= chance;
        if critical {
            self.flag(CommitFlags::CRITICAL);
        }
        critical
    }

    /// Damage this cast deals to `target` before it is applied.
    pub fn compute_damage(&self, target: CharacterId, critical: bool) -> Result<i32, EffectError> {
        let definition = self.definition();
        let damage_type = definition.damage_type.ok_or(EffectError::Misconfigured {
            skill: definition.id,
            reason: "damaging skills need a damage type",
        })?;
        let school = damage_type.school();
        let caller = self.character(self.caller())?;
        let defender = self.character(target)?;

        Ok(damage::compute_damage(&DamageInput {
            damage_type,
            power: definition.power,
            attack: caller.stat(school.attack_stat()),
            defense: school.defense_stat().map_or(0, |stat| defender.stat(stat)),
            armor: defender.armor_type(damage_type),
            critical,
            weakened: caller.has_status(StatusKind::Weakened),
            shielded: defender.has_status(StatusKind::Shielded),
        }))
    }

    /// Gatekeeper for a skill's main effect: the caller must be alive, at
    /// least one target must be alive, no blocking status may be active and
    /// the cost must be affordable. Pays the cost on success; otherwise sets
    /// the matching flag and returns false.
    pub fn begin_action(&mut self) -> Result<bool, EffectError> {
        let caller = self.character(self.caller())?;
        let targets_alive = self.info.targets.is_empty()
            || self.info.targets.as_slice().iter().any(|id| self.is_alive(*id));

        if !caller.is_alive() || !targets_alive {
            self.flag(CommitFlags::DIED_BEFORE_ACTION);
            return Ok(false);
        }
        if !caller.can_perform(&self.info.definition.blocked_by) {
            self.flag(CommitFlags::BLOCKED);
            return Ok(false);
        }
        if let Some(cost) = self.info.definition.cost {
            if caller.stat(cost.stat) < cost.amount {
                self.flag(CommitFlags::EXHAUSTED);
                return Ok(false);
            }
            let caller = self.caller();
            self.real_damage(caller, cost.amount, cost.stat)?;
        }
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Mutators
    // ------------------------------------------------------------------

    fn mutate<R>(
        &mut self,
        id: CharacterId,
        apply: impl FnOnce(&mut CharacterState, CastRef) -> R,
    ) -> Result<R, EffectError> {
        let source = self.info.source();
        let character = self.roster.get_mut(id).ok_or(EffectError::UnknownCharacter(id))?;
        let result = apply(character, source);
        self.changes.extend(character.drain_changes());
        Ok(result)
    }

    pub fn damage(&mut self, target: CharacterId, amount: i32) -> Result<i32, EffectError> {
        let applied = self.mutate(target, |character, source| character.damage(amount, source))?;
        trace!(target: "duel::battle", cast = %self.info.id, %target, applied, "damage");
        Ok(applied)
    }

    pub fn real_damage(
        &mut self,
        target: CharacterId,
        amount: i32,
        stat: StatKind,
    ) -> Result<i32, EffectError> {
        self.mutate(target, |character, source| character.real_damage(amount, stat, source))
    }

    pub fn heal(
        &mut self,
        target: CharacterId,
        amount: i32,
        stat: StatKind,
    ) -> Result<i32, EffectError> {
        self.mutate(target, |character, source| character.heal(amount, stat, source))
    }

    pub fn alter_stat(
        &mut self,
        target: CharacterId,
        delta: i32,
        stat: StatKind,
    ) -> Result<i32, EffectError> {
        self.mutate(target, |character, source| character.alter_stat(delta, stat, source))
    }

    pub fn set_class(
        &mut self,
        target: CharacterId,
        class: ClassId,
    ) -> Result<Option<ClassId>, EffectError> {
        self.mutate(target, |character, source| character.set_class(class, source))
    }

    /// Grants a status owned by this cast. A weaker effect it replaces has
    /// its owning cast cancelled.
    pub fn grant_status(
        &mut self,
        target: CharacterId,
        kind: StatusKind,
        expires: Round,
        silent: bool,
    ) -> Result<Grant, EffectError> {
        let grant = self.mutate(target, |character, source| {
            character.grant_status(kind, source, expires, silent)
        })?;
        if let Grant::Granted {
            displaced: Some(owner),
        } = grant
        {
            self.cancel_owner(owner, target, &[kind])?;
        }
        Ok(grant)
    }

    pub fn set_status(
        &mut self,
        target: CharacterId,
        ids: &[StatusKind],
        expires: Round,
    ) -> Result<Vec<bool>, EffectError> {
        let mut granted = Vec::with_capacity(ids.len());
        for kind in ids {
            granted.push(self.grant_status(target, *kind, expires, false)?.is_granted());
        }
        Ok(granted)
    }

    /// Removes statuses this cast owns on `target`.
    pub fn unset_status(
        &mut self,
        target: CharacterId,
        ids: &[StatusKind],
        silent: bool,
    ) -> Result<Vec<StatusKind>, EffectError> {
        let owner = self.info.id;
        self.mutate(target, |character, _| character.unset_status(ids, owner, silent))
    }

    /// Strips statuses from `target` whoever owns them and cancels each
    /// owner with the ids it lost.
    pub fn purge_status(
        &mut self,
        target: CharacterId,
        ids: &[StatusKind],
    ) -> Result<Vec<StatusEffect>, EffectError> {
        let removed = self.mutate(target, |character, _| character.purge_status(ids))?;

        let mut owners: Vec<(CastId, Vec<StatusKind>)> = Vec::new();
        for effect in &removed {
            match owners.iter_mut().find(|(owner, _)| *owner == effect.owner) {
                Some((_, kinds)) => kinds.push(effect.kind),
                None => owners.push((effect.owner, vec![effect.kind])),
            }
        }
        for (owner, kinds) in owners {
            self.cancel_owner(owner, target, &kinds)?;
        }
        Ok(removed)
    }

    /// Runs `owner`'s cancel hook in a nested effect scope and appends its
    /// changes to this commit.
    fn cancel_owner(
        &mut self,
        owner: CastId,
        target: CharacterId,
        reasons: &[StatusKind],
    ) -> Result<bool, EffectError> {
        if owner == self.info.id {
            return Ok(false);
        }
        let instance = self.casts.get_mut(owner).ok_or(EffectError::UnknownCast(owner))?;
        let Some(mut behavior) = instance.take_behavior() else {
            debug!(target: "duel::battle", cast = %owner, "skipped cancel of running cast");
            return Ok(false);
        };
        let info = instance.info().clone();

        let (result, changes) = {
            let mut nested = Effects {
                info,
                roster: &mut *self.roster,
                scheduler: &mut *self.scheduler,
                casts: &mut *self.casts,
                dice: self.dice,
                seed: self.seed,
                context: CANCEL_CONTEXT,
                rolls: 0,
                changes: Vec::new(),
                flags: CommitFlags::empty(),
            };
            let result = behavior.cancel(target, reasons, &mut nested);
            (result, nested.changes)
        };

        if let Some(instance) = self.casts.get_mut(owner) {
            instance.restore_behavior(behavior);
        }
        self.changes.extend(changes);

        let undone = result?;
        debug!(
            target: "duel::battle",
            cast = %owner,
            by = %self.info.id,
            %target,
            undone,
            "cancelled cast"
        );
        Ok(undone)
    }
}

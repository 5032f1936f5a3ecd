//! Character combat state: the single point of mutation for a character during
//! battle.
//!
//! Every mutator appends the [`Change`]s it produced to a private per-character
//! buffer. The battle drains that buffer after each call so the round's commit
//! log keeps the exact order in which mutations happened. Mutating a character
//! that is no longer alive is a silent no-op.
mod change;
mod roster;
mod stat;
mod status;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::damage::{ArmorType, DamageType, School};
use crate::ids::{CastId, CharacterId, ClassId, Round, Side, SkillId};
use crate::skill::CastInstance;

pub use change::{Change, ChangeKind, StatusDelta};
pub use roster::Roster;
pub use stat::{Stat, StatKind};
pub use status::{Grant, StatusEffect, StatusKind};

/// The cast a mutation is attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CastRef {
    pub cast: CastId,
    pub skill: SkillId,
    pub caller: CharacterId,
}

/// Runtime record of one character in a battle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterState {
    id: CharacterId,
    name: String,
    side: Side,
    class: ClassId,
    stats: BTreeMap<StatKind, Stat>,
    statuses: BTreeMap<StatusKind, StatusEffect>,
    armor: ArmorType,
    ward: ArmorType,
    skills: Vec<SkillId>,
    alive: bool,
    #[serde(skip)]
    pending: Vec<Change>,
}

impl CharacterState {
    pub fn new(id: CharacterId, name: impl Into<String>, side: Side, class: ClassId) -> Self {
        Self {
            id,
            name: name.into(),
            side,
            class,
            stats: BTreeMap::new(),
            statuses: BTreeMap::new(),
            armor: ArmorType::Unarmored,
            ward: ArmorType::Unarmored,
            skills: Vec::new(),
            alive: true,
            pending: Vec::new(),
        }
    }

    /// Sets a stat at construction time. Health of zero marks the character dead.
    pub fn with_stat(mut self, kind: StatKind, stat: Stat) -> Self {
        if kind == StatKind::Health {
            self.alive = stat.value > 0;
        }
        self.stats.insert(kind, stat);
        self
    }

    pub fn with_armor(mut self, armor: ArmorType, ward: ArmorType) -> Self {
        self.armor = armor;
        self.ward = ward;
        self
    }

    pub fn with_skills(mut self, skills: impl IntoIterator<Item = SkillId>) -> Self {
        self.skills = skills.into_iter().collect();
        self
    }

    /// Moves the character to another side, used when seating a team in a room.
    pub fn on_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    /// Rebinds the character to a battle-local handle.
    pub fn with_id(mut self, id: CharacterId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> CharacterId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn class(&self) -> ClassId {
        self.class
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn skills(&self) -> &[SkillId] {
        &self.skills
    }

    pub fn stats(&self) -> &BTreeMap<StatKind, Stat> {
        &self.stats
    }

    pub fn stat_entry(&self, kind: StatKind) -> Option<Stat> {
        self.stats.get(&kind).copied()
    }

    /// Current value of a stat; absent stats read as zero.
    pub fn stat(&self, kind: StatKind) -> i32 {
        self.stats.get(&kind).map_or(0, |stat| stat.value)
    }

    pub fn statuses(&self) -> &BTreeMap<StatusKind, StatusEffect> {
        &self.statuses
    }

    pub fn status(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.statuses.get(&kind)
    }

    pub fn has_status(&self, kind: StatusKind) -> bool {
        self.statuses.contains_key(&kind)
    }

    /// Armor that applies against `damage_type`: armor for physical hits, ward
    /// for magical ones, nothing for true damage.
    pub fn armor_type(&self, damage_type: DamageType) -> ArmorType {
        match damage_type.school() {
            School::Physical => self.armor,
            School::Magical => self.ward,
            School::True => ArmorType::Unarmored,
        }
    }

    /// True unless one of `blocked_by` is currently active.
    pub fn can_perform(&self, blocked_by: &[StatusKind]) -> bool {
        !blocked_by.iter().any(|kind| self.has_status(*kind))
    }

    pub fn can_perform_action(&self, cast: &CastInstance) -> bool {
        self.can_perform(&cast.definition().blocked_by)
    }

    /// Changes recorded since the last drain, oldest first.
    pub fn pending_changes(&self) -> &[Change] {
        &self.pending
    }

    pub fn drain_changes(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.pending)
    }

    // ------------------------------------------------------------------
    // Mutators
    // ------------------------------------------------------------------

    /// Subtracts `amount` from health, clamped at zero. Returns the amount
    /// actually removed.
    pub fn damage(&mut self, amount: i32, source: CastRef) -> i32 {
        if !self.alive || amount <= 0 {
            return 0;
        }

        let health = self.stats.entry(StatKind::Health).or_insert(Stat::new(0));
        let applied = amount.min(health.value.max(0));
        health.value -= applied;
        let remaining = health.value;

        if applied != 0 {
            self.pending
                .push(Change::stat(self.id, StatKind::Health, -applied));
        }
        if remaining <= 0 {
            self.alive = false;
            trace!(
                target: "duel::character",
                character = %self.id,
                cast = %source.cast,
                "character fell"
            );
        }
        applied
    }

    /// Subtracts from an arbitrary stat without the health clamp, used for
    /// resource costs. Health is routed through [`Self::damage`].
    pub fn real_damage(&mut self, amount: i32, stat: StatKind, source: CastRef) -> i32 {
        if stat == StatKind::Health {
            return self.damage(amount, source);
        }
        if !self.alive || amount <= 0 {
            return 0;
        }

        self.stats.entry(stat).or_insert(Stat::new(0)).value -= amount;
        self.pending.push(Change::stat(self.id, stat, -amount));
        amount
    }

    /// Adds to a stat, capped at its maximum if it has one. Returns the
    /// amount actually added.
    pub fn heal(&mut self, amount: i32, stat: StatKind, _source: CastRef) -> i32 {
        if !self.alive || amount <= 0 {
            return 0;
        }

        let entry = self.stats.entry(stat).or_insert(Stat::new(0));
        let target = match entry.max {
            Some(max) => (entry.value + amount).min(max).max(entry.value),
            None => entry.value + amount,
        };
        let applied = target - entry.value;
        entry.value = target;

        if applied != 0 {
            self.pending.push(Change::stat(self.id, stat, applied));
        }
        applied
    }

    /// Adds a signed delta to a stat, flooring it at zero. Returns the delta
    /// actually applied so the caller can later issue the exact inverse.
    pub fn alter_stat(&mut self, delta: i32, stat: StatKind, _source: CastRef) -> i32 {
        if !self.alive || delta == 0 {
            return 0;
        }

        let entry = self.stats.entry(stat).or_insert(Stat::new(0));
        let before = entry.value;
        entry.value = (before + delta).max(0);
        let applied = entry.value - before;
        let after = entry.value;

        if applied != 0 {
            self.pending.push(Change::stat(self.id, stat, applied));
        }
        if stat == StatKind::Health && after == 0 {
            self.alive = false;
        }
        applied
    }

    /// Whether [`Self::grant_status`] would accept `kind` expiring at the end
    /// of round `expires`.
    pub fn would_grant(&self, kind: StatusKind, expires: Round) -> bool {
        self.alive
            && self
                .statuses
                .get(&kind)
                .is_none_or(|existing| existing.expires < expires)
    }

    /// Grants one status expiring at the end of round `expires`.
    ///
    /// The grant wins if the status is absent or the existing effect expires
    /// strictly earlier; ties keep the existing effect.
    pub fn grant_status(
        &mut self,
        kind: StatusKind,
        source: CastRef,
        expires: Round,
        silent: bool,
    ) -> Grant {
        if !self.alive {
            return Grant::Dead;
        }

        let displaced = match self.statuses.get(&kind) {
            Some(existing) if existing.expires >= expires => {
                return Grant::Rejected {
                    holder: existing.owner,
                };
            }
            Some(existing) => Some(existing.owner),
            None => None,
        };

        self.statuses.insert(
            kind,
            StatusEffect {
                kind,
                owner: source.cast,
                skill: source.skill,
                expires,
                silent,
            },
        );
        self.pending
            .push(Change::status(self.id, kind, StatusDelta::Applied));
        Grant::Granted { displaced }
    }

    /// Grants every id in `ids`, returning whether each one took.
    pub fn set_status(
        &mut self,
        ids: &[StatusKind],
        source: CastRef,
        expires: Round,
    ) -> Vec<bool> {
        ids.iter()
            .map(|kind| self.grant_status(*kind, source, expires, false).is_granted())
            .collect()
    }

    /// Removes the statuses in `ids` that `owner` currently holds. Returns the
    /// ids actually removed. Removal is logged unless `silent` is set or the
    /// effect itself is silent.
    pub fn unset_status(
        &mut self,
        ids: &[StatusKind],
        owner: CastId,
        silent: bool,
    ) -> Vec<StatusKind> {
        let mut removed = Vec::new();
        for kind in ids {
            let Some(effect) = self.statuses.get(kind) else {
                continue;
            };
            if effect.owner != owner {
                continue;
            }
            let quiet = silent || effect.silent;
            self.statuses.remove(kind);
            if !quiet {
                self.pending
                    .push(Change::status(self.id, *kind, StatusDelta::Removed));
            }
            removed.push(*kind);
        }
        removed
    }

    /// Removes the statuses in `ids` whoever owns them. Returns the removed
    /// effects so their owners can be cancelled.
    pub fn purge_status(&mut self, ids: &[StatusKind]) -> Vec<StatusEffect> {
        let mut removed = Vec::new();
        for kind in ids {
            if let Some(effect) = self.statuses.remove(kind) {
                self.pending
                    .push(Change::status(self.id, *kind, StatusDelta::Removed));
                removed.push(effect);
            }
        }
        removed
    }

    /// Changes the character's class. Returns the previous class, or `None`
    /// if nothing changed.
    pub fn set_class(&mut self, class: ClassId, _source: CastRef) -> Option<ClassId> {
        if !self.alive || self.class == class {
            return None;
        }
        let previous = std::mem::replace(&mut self.class, class);
        self.pending.push(Change::class(self.id, class));
        Some(previous)
    }
}

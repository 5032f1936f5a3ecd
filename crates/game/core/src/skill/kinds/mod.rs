//! One [`SkillBehavior`] per [`SkillKind`].
mod cleanse;
mod drain;
mod fortify;
mod link;
mod mend;
mod metamorph;
mod poison;
mod status;
mod strike;

use crate::character::{StatKind, StatusKind};
use crate::error::EffectError;
use crate::ids::CharacterId;
use crate::skill::{Effects, SkillBehavior, SkillKind};

pub use cleanse::Cleanse;
pub use drain::Drain;
pub use fortify::Fortify;
pub use link::Link;
pub use mend::Mend;
pub use metamorph::Metamorph;
pub use poison::Poison;
pub use status::Afflict;
pub use strike::Strike;

impl SkillKind {
    /// Fresh behavior state for one cast of this kind.
    pub fn behavior(self) -> Box<dyn SkillBehavior> {
        match self {
            SkillKind::Strike => Box::new(Strike),
            SkillKind::Drain => Box::new(Drain),
            SkillKind::Mend => Box::new(Mend),
            SkillKind::Fortify => Box::<Fortify>::default(),
            SkillKind::Afflict => Box::<Afflict>::default(),
            SkillKind::Poison => Box::<Poison>::default(),
            SkillKind::Link => Box::<Link>::default(),
            SkillKind::Cleanse => Box::new(Cleanse),
            SkillKind::Metamorph => Box::<Metamorph>::default(),
        }
    }
}

fn required_status(fx: &Effects<'_>) -> Result<StatusKind, EffectError> {
    let definition = fx.definition();
    definition.status.ok_or(EffectError::Misconfigured {
        skill: definition.id,
        reason: "timed skills need a status",
    })
}

fn required_stat(fx: &Effects<'_>) -> Result<StatKind, EffectError> {
    let definition = fx.definition();
    definition.stat.ok_or(EffectError::Misconfigured {
        skill: definition.id,
        reason: "fortify needs a stat",
    })
}

/// Hostile effects roll accuracy; effects on the caller's own side always land.
fn lands(fx: &mut Effects<'_>, target: CharacterId) -> Result<bool, EffectError> {
    let caller_side = fx.character(fx.caller())?.side();
    if fx.character(target)?.side() == caller_side {
        return Ok(true);
    }
    fx.roll_hit(target)
}

/// Rolls and deals damage to every living target. Returns the total applied.
fn strike_all(fx: &mut Effects<'_>) -> Result<i32, EffectError> {
    let mut critical = None;
    let mut total = 0;

    for target in fx.targets() {
        if !fx.is_alive(target) || !fx.roll_hit(target)? {
            continue;
        }
        let crit = match critical {
            Some(crit) => crit,
            None => {
                let crit = fx.roll_critical();
                critical = Some(crit);
                crit
            }
        };
        let amount = fx.compute_damage(target, crit)?;
        total += fx.damage(target, amount)?;
    }
    Ok(total)
}

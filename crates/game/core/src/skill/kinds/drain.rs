use crate::character::StatKind;
use crate::error::EffectError;
use crate::skill::{Effects, Hook, SkillBehavior};

use super::strike_all;

/// Damages the targets, then heals the caller by half of what landed.
#[derive(Debug, Default)]
pub struct Drain;

impl SkillBehavior for Drain {
    fn fire(&mut self, hook: Hook, fx: &mut Effects<'_>) -> Result<(), EffectError> {
        if hook != Hook::Resolve || !fx.begin_action()? {
            return Ok(());
        }
        let dealt = strike_all(fx)?;
        if dealt / 2 > 0 {
            let caller = fx.caller();
            fx.heal(caller, dealt / 2, StatKind::Health)?;
        }
        Ok(())
    }
}

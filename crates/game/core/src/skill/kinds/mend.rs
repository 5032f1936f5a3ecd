use crate::character::StatKind;
use crate::error::EffectError;
use crate::skill::{Effects, Hook, SkillBehavior};

/// Heals every target by power plus half the caller's intelligence.
#[derive(Debug, Default)]
pub struct Mend;

impl SkillBehavior for Mend {
    fn fire(&mut self, hook: Hook, fx: &mut Effects<'_>) -> Result<(), EffectError> {
        if hook != Hook::Resolve || !fx.begin_action()? {
            return Ok(());
        }
        let amount =
            fx.definition().power + fx.character(fx.caller())?.stat(StatKind::Intelligence) / 2;
        for target in fx.targets() {
            fx.heal(target, amount, StatKind::Health)?;
        }
        Ok(())
    }
}

use crate::error::EffectError;
use crate::skill::{Effects, Hook, SkillBehavior};

/// Strips the listed statuses from every target, cancelling whoever owned them.
#[derive(Debug, Default)]
pub struct Cleanse;

impl SkillBehavior for Cleanse {
    fn fire(&mut self, hook: Hook, fx: &mut Effects<'_>) -> Result<(), EffectError> {
        if hook != Hook::Resolve || !fx.begin_action()? {
            return Ok(());
        }
        let dispels = fx.definition().dispels.clone();
        for target in fx.targets() {
            fx.purge_status(target, &dispels)?;
        }
        Ok(())
    }
}

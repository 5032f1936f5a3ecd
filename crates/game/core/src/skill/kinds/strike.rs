use crate::error::EffectError;
use crate::skill::{Effects, Hook, SkillBehavior};

use super::strike_all;

#[derive(Debug, Default)]
pub struct Strike;

impl SkillBehavior for Strike {
    fn fire(&mut self, hook: Hook, fx: &mut Effects<'_>) -> Result<(), EffectError> {
        if hook != Hook::Resolve || !fx.begin_action()? {
            return Ok(());
        }
        strike_all(fx)?;
        Ok(())
    }
}

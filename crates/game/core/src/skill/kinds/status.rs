use crate::character::StatusKind;
use crate::error::EffectError;
use crate::ids::CharacterId;
use crate::scheduler::{Phase, Token};
use crate::skill::{Effects, Hook, SkillBehavior};

use super::{lands, required_status};

/// Timed status on every target (stun, silence, shield, haste...).
#[derive(Debug, Default)]
pub struct Afflict {
    granted: Vec<CharacterId>,
    expiry: Option<Token>,
}

impl SkillBehavior for Afflict {
    fn fire(&mut self, hook: Hook, fx: &mut Effects<'_>) -> Result<(), EffectError> {
        let status = required_status(fx)?;

        match hook {
            Hook::Resolve => {
                if !fx.begin_action()? {
                    return Ok(());
                }
                let (ahead, expires) = fx.expiry(fx.definition().duration);
                for target in fx.targets() {
                    if !fx.is_alive(target) || !lands(fx, target)? {
                        continue;
                    }
                    if fx.grant_status(target, status, expires, false)?.is_granted() {
                        self.granted.push(target);
                    }
                }
                if !self.granted.is_empty() {
                    self.expiry = Some(fx.schedule_in(ahead, Phase::EndOfRound, Hook::Expire)?);
                }
            }
            Hook::Expire => {
                self.expiry = None;
                for target in std::mem::take(&mut self.granted) {
                    fx.unset_status(target, &[status], false)?;
                }
            }
            Hook::Tick => {}
        }
        Ok(())
    }

    fn cancel(
        &mut self,
        target: CharacterId,
        reasons: &[StatusKind],
        fx: &mut Effects<'_>,
    ) -> Result<bool, EffectError> {
        if !reasons.contains(&required_status(fx)?) {
            return Ok(false);
        }
        let before = self.granted.len();
        self.granted.retain(|id| *id != target);
        if self.granted.len() == before {
            return Ok(false);
        }
        if self.granted.is_empty()
            && let Some(token) = self.expiry.take()
        {
            fx.cancel(token)?;
        }
        Ok(true)
    }
}

use crate::character::StatusKind;
use crate::error::EffectError;
use crate::ids::CharacterId;
use crate::scheduler::{Phase, Token};
use crate::skill::{Effects, Hook, SkillBehavior};

use super::{lands, required_status};

/// Deals `power` damage after every damage phase while its status holds.
#[derive(Debug, Default)]
pub struct Poison {
    afflicted: Vec<CharacterId>,
    tick: Option<Token>,
    expiry: Option<Token>,
}

impl Poison {
    fn stop(&mut self, fx: &mut Effects<'_>) -> Result<(), EffectError> {
        if let Some(token) = self.tick.take() {
            fx.unregister(token)?;
        }
        if let Some(token) = self.expiry.take() {
            fx.cancel(token)?;
        }
        Ok(())
    }
}

impl SkillBehavior for Poison {
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
                        self.afflicted.push(target);
                    }
                }
                if !self.afflicted.is_empty() {
                    self.tick = Some(fx.register_each(Phase::AfterDamage, Hook::Tick));
                    self.expiry = Some(fx.schedule_in(ahead, Phase::EndOfRound, Hook::Expire)?);
                }
            }
            Hook::Tick => {
                let power = fx.definition().power;
                for target in self.afflicted.clone() {
                    fx.damage(target, power)?;
                }
            }
            Hook::Expire => {
                self.expiry = None;
                self.stop(fx)?;
                for target in std::mem::take(&mut self.afflicted) {
                    fx.unset_status(target, &[status], false)?;
                }
            }
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
        let before = self.afflicted.len();
        self.afflicted.retain(|id| *id != target);
        if self.afflicted.len() == before {
            return Ok(false);
        }
        if self.afflicted.is_empty() {
            self.stop(fx)?;
        }
        Ok(true)
    }
}

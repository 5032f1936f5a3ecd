use crate::character::StatusKind;
use crate::error::EffectError;
use crate::ids::CharacterId;
use crate::scheduler::{Phase, Token};
use crate::skill::{Effects, Hook, SkillBehavior};

use super::{lands, required_stat, required_status};

/// Temporary stat change held by a status.
///
/// The applied delta is remembered per target so the exact inverse is issued
/// on expiry, or early when another effect strips the status.
#[derive(Debug, Default)]
pub struct Fortify {
    applied: Vec<(CharacterId, i32)>,
    expiry: Option<Token>,
}

impl Fortify {
    fn revert(&mut self, target: CharacterId, fx: &mut Effects<'_>) -> Result<bool, EffectError> {
        let Some(index) = self.applied.iter().position(|(id, _)| *id == target) else {
            return Ok(false);
        };
        let (_, delta) = self.applied.remove(index);
        let stat = required_stat(fx)?;
        fx.alter_stat(target, -delta, stat)?;
        Ok(true)
    }
}

impl SkillBehavior for Fortify {
    fn fire(&mut self, hook: Hook, fx: &mut Effects<'_>) -> Result<(), EffectError> {
        let status = required_status(fx)?;

        match hook {
            Hook::Resolve => {
                if !fx.begin_action()? {
                    return Ok(());
                }
                let stat = required_stat(fx)?;
                let power = fx.definition().power;
                let (ahead, expires) = fx.expiry(fx.definition().duration);

                for target in fx.targets() {
                    if !fx.is_alive(target) || !lands(fx, target)? {
                        continue;
                    }
                    if fx.grant_status(target, status, expires, false)?.is_granted() {
                        let delta = fx.alter_stat(target, power, stat)?;
                        self.applied.push((target, delta));
                    }
                }

                if !self.applied.is_empty() {
                    self.expiry = Some(fx.schedule_in(ahead, Phase::EndOfRound, Hook::Expire)?);
                }
            }
            Hook::Expire => {
                self.expiry = None;
                for (target, _) in self.applied.clone() {
                    fx.unset_status(target, &[status], false)?;
                    self.revert(target, fx)?;
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
        if !reasons.contains(&required_status(fx)?) || !self.revert(target, fx)? {
            return Ok(false);
        }
        if self.applied.is_empty()
            && let Some(token) = self.expiry.take()
        {
            fx.cancel(token)?;
        }
        Ok(true)
    }
}

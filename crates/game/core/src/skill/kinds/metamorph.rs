use crate::character::StatusKind;
use crate::error::EffectError;
use crate::ids::{CharacterId, ClassId};
use crate::scheduler::{Phase, Token};
use crate::skill::{Effects, Hook, SkillBehavior};

use super::lands;

/// Turns targets into another class for a while, marked by `Morphed`.
#[derive(Debug, Default)]
pub struct Metamorph {
    /// Target and the class it had before.
    morphed: Vec<(CharacterId, ClassId)>,
    expiry: Option<Token>,
}

impl Metamorph {
    fn restore(&mut self, target: CharacterId, fx: &mut Effects<'_>) -> Result<bool, EffectError> {
        let Some(index) = self.morphed.iter().position(|(id, _)| *id == target) else {
            return Ok(false);
        };
        let (_, previous) = self.morphed.remove(index);
        fx.set_class(target, previous)?;
        Ok(true)
    }
}

impl SkillBehavior for Metamorph {
    fn fire(&mut self, hook: Hook, fx: &mut Effects<'_>) -> Result<(), EffectError> {
        match hook {
            Hook::Resolve => {
                if !fx.begin_action()? {
                    return Ok(());
                }
                let definition = fx.definition();
                let class = definition.class_shift.ok_or(EffectError::Misconfigured {
                    skill: definition.id,
                    reason: "metamorph needs a class to shift into",
                })?;
                let (ahead, expires) = fx.expiry(definition.duration);

                for target in fx.targets() {
                    if !fx.is_alive(target) || !lands(fx, target)? {
                        continue;
                    }
                    if !fx.grant_status(target, StatusKind::Morphed, expires, false)?.is_granted() {
                        continue;
                    }
                    let current = fx.character(target)?.class();
                    fx.set_class(target, class)?;
                    self.morphed.push((target, current));
                }

                if !self.morphed.is_empty() {
                    self.expiry = Some(fx.schedule_in(ahead, Phase::EndOfRound, Hook::Expire)?);
                }
            }
            Hook::Expire => {
                self.expiry = None;
                for (target, _) in self.morphed.clone() {
                    fx.unset_status(target, &[StatusKind::Morphed], false)?;
                    self.restore(target, fx)?;
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
        if !reasons.contains(&StatusKind::Morphed) || !self.restore(target, fx)? {
            return Ok(false);
        }
        if self.morphed.is_empty()
            && let Some(token) = self.expiry.take()
        {
            fx.cancel(token)?;
        }
        Ok(true)
    }
}

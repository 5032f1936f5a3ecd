use crate::character::StatusKind;
use crate::error::EffectError;
use crate::ids::CharacterId;
use crate::scheduler::{CommitFlags, Phase, Token};
use crate::skill::{Effects, Hook, SkillBehavior};

use super::required_status;

/// Binds two characters with the same status. Either both take it or neither
/// keeps it; losing it on one side breaks it on the other.
#[derive(Debug, Default)]
pub struct Link {
    linked: Vec<CharacterId>,
    expiry: Option<Token>,
}

impl SkillBehavior for Link {
    fn fire(&mut self, hook: Hook, fx: &mut Effects<'_>) -> Result<(), EffectError> {
        let status = required_status(fx)?;

        match hook {
            Hook::Resolve => {
                if !fx.begin_action()? {
                    return Ok(());
                }
                let (ahead, expires) = fx.expiry(fx.definition().duration);
                let targets = fx.targets();

                // Granting displaces and cancels weaker links, so nothing is
                // granted unless every target accepts.
                for target in &targets {
                    if !fx.character(*target)?.would_grant(status, expires) {
                        fx.flag(CommitFlags::REJECTED);
                        return Ok(());
                    }
                }

                let mut accepted = Vec::with_capacity(targets.len());
                for target in &targets {
                    if fx.grant_status(*target, status, expires, false)?.is_granted() {
                        accepted.push(*target);
                    }
                }

                if accepted.len() < targets.len() {
                    for target in accepted {
                        fx.unset_status(target, &[status], false)?;
                    }
                    fx.flag(CommitFlags::REJECTED);
                    return Ok(());
                }

                self.linked = accepted;
                self.expiry = Some(fx.schedule_in(ahead, Phase::EndOfRound, Hook::Expire)?);
            }
            Hook::Expire => {
                self.expiry = None;
                for target in std::mem::take(&mut self.linked) {
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
        let status = required_status(fx)?;
        if !reasons.contains(&status) || !self.linked.contains(&target) {
            return Ok(false);
        }
        for other in std::mem::take(&mut self.linked) {
            if other != target {
                fx.unset_status(other, &[status], false)?;
            }
        }
        if let Some(token) = self.expiry.take() {
            fx.cancel(token)?;
        }
        Ok(true)
    }
}

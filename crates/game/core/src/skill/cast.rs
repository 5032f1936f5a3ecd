use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::character::CastRef;
use crate::error::CastError;
use crate::field::Field;
use crate::ids::{CastId, CharacterId, SkillId};
use crate::skill::{SkillBehavior, SkillBook, SkillDefinition, Targets};

/// Read-only part of a cast: who, on whom, with what.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CastInfo {
    pub id: CastId,
    pub caller: CharacterId,
    pub targets: Targets,
    pub definition: Arc<SkillDefinition>,
}

impl CastInfo {
    pub fn skill(&self) -> SkillId {
        self.definition.id
    }

    pub fn source(&self) -> CastRef {
        CastRef {
            cast: self.id,
            skill: self.definition.id,
            caller: self.caller,
        }
    }
}

/// One concrete use of a skill.
///
/// The behavior is taken out while one of its callbacks runs, so a cast can
/// never be re-entered by an effect it triggered itself.
pub struct CastInstance {
    info: CastInfo,
    behavior: Option<Box<dyn SkillBehavior>>,
}

impl CastInstance {
    pub fn new(
        id: CastId,
        caller: CharacterId,
        targets: Targets,
        definition: Arc<SkillDefinition>,
    ) -> Self {
        let behavior = definition.kind.behavior();
        Self {
            info: CastInfo {
                id,
                caller,
                targets,
                definition,
            },
            behavior: Some(behavior),
        }
    }

    pub fn info(&self) -> &CastInfo {
        &self.info
    }

    pub fn id(&self) -> CastId {
        self.info.id
    }

    pub fn caller(&self) -> CharacterId {
        self.info.caller
    }

    pub fn targets(&self) -> &Targets {
        &self.info.targets
    }

    pub fn definition(&self) -> &SkillDefinition {
        &self.info.definition
    }

    pub fn is_running(&self) -> bool {
        self.behavior.is_none()
    }

    pub(crate) fn take_behavior(&mut self) -> Option<Box<dyn SkillBehavior>> {
        self.behavior.take()
    }

    pub(crate) fn restore_behavior(&mut self, behavior: Box<dyn SkillBehavior>) {
        self.behavior = Some(behavior);
    }
}

impl fmt::Debug for CastInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CastInstance")
            .field("id", &self.info.id)
            .field("skill", &self.info.definition.id)
            .field("caller", &self.info.caller)
            .field("targets", &self.info.targets)
            .field("behavior", &self.behavior)
            .finish()
    }
}

/// Turns a caller/target selection into a cast instance.
///
/// Fails with [`CastError`] for an unknown skill or a selection that does not
/// fit the skill's targeting mode.
pub fn cast(
    book: &SkillBook,
    field: &dyn Field,
    id: CastId,
    caller: CharacterId,
    selection: &[CharacterId],
    skill: SkillId,
) -> Result<CastInstance, CastError> {
    let definition = book.get(skill).ok_or(CastError::UnknownSkill(skill))?;
    let targets = definition.targeting.resolve(skill, field, selection)?;
    Ok(CastInstance::new(id, caller, targets, definition))
}

/// Every cast created in a battle, addressed by id.
#[derive(Debug, Default)]
pub struct CastArena {
    casts: BTreeMap<CastId, CastInstance>,
    next: u32,
}

impl CastArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> CastId {
        let id = CastId(self.next);
        self.next += 1;
        id
    }

    pub fn insert(&mut self, instance: CastInstance) {
        self.casts.insert(instance.id(), instance);
    }

    pub fn get(&self, id: CastId) -> Option<&CastInstance> {
        self.casts.get(&id)
    }

    pub fn get_mut(&mut self, id: CastId) -> Option<&mut CastInstance> {
        self.casts.get_mut(&id)
    }

    /// Keeps only the casts for which `keep` returns true. Ids are never reused.
    pub fn retain(&mut self, mut keep: impl FnMut(CastId) -> bool) {
        self.casts.retain(|id, _| keep(*id));
    }

    pub fn len(&self) -> usize {
        self.casts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.casts.is_empty()
    }
}

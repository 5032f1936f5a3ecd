use std::collections::HashMap;
use std::sync::Arc;

use crate::ids::SkillId;
use crate::skill::SkillDefinition;

/// Read-only lookup of skill definitions by id, shared across rooms.
#[derive(Clone, Debug, Default)]
pub struct SkillBook {
    skills: HashMap<SkillId, Arc<SkillDefinition>>,
}

impl SkillBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, definition: SkillDefinition) -> Option<Arc<SkillDefinition>> {
        self.skills.insert(definition.id, Arc::new(definition))
    }

    pub fn get(&self, id: SkillId) -> Option<Arc<SkillDefinition>> {
        self.skills.get(&id).cloned()
    }

    pub fn contains(&self, id: SkillId) -> bool {
        self.skills.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillDefinition> {
        self.skills.values().map(Arc::as_ref)
    }
}

impl FromIterator<SkillDefinition> for SkillBook {
    fn from_iter<I: IntoIterator<Item = SkillDefinition>>(iter: I) -> Self {
        let mut book = SkillBook::new();
        for definition in iter {
            book.insert(definition);
        }
        book
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::character::CharacterState;
use crate::ids::{CharacterId, Side};

/// Arena of every character in a battle, keyed by id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    characters: BTreeMap<CharacterId, CharacterState>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a character, returning the one it replaced.
    pub fn insert(&mut self, character: CharacterState) -> Option<CharacterState> {
        self.characters.insert(character.id(), character)
    }

    pub fn get(&self, id: CharacterId) -> Option<&CharacterState> {
        self.characters.get(&id)
    }

    pub fn get_mut(&mut self, id: CharacterId) -> Option<&mut CharacterState> {
        self.characters.get_mut(&id)
    }

    pub fn contains(&self, id: CharacterId) -> bool {
        self.characters.contains_key(&id)
    }

    pub fn is_alive(&self, id: CharacterId) -> bool {
        self.get(id).is_some_and(CharacterState::is_alive)
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CharacterState> {
        self.characters.values()
    }

    pub fn members(&self, side: Side) -> impl Iterator<Item = &CharacterState> {
        self.iter().filter(move |character| character.side() == side)
    }

    /// A side is defeated once none of its characters is alive.
    pub fn defeated(&self, side: Side) -> bool {
        self.members(side).all(|character| !character.is_alive())
    }
}

impl FromIterator<CharacterState> for Roster {
    fn from_iter<I: IntoIterator<Item = CharacterState>>(iter: I) -> Self {
        let mut roster = Roster::new();
        for character in iter {
            roster.insert(character);
        }
        roster
    }
}

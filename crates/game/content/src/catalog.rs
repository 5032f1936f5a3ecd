//! In-memory content catalog and stat aggregation.
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, bail};
use duel_core::{
    CharacterId, CharacterState, ClassId, PlacementError, Side, SkillBook, SkillDefinition, Slot,
    Stat, StatKind,
};
use thiserror::Error;

use crate::model::{
    Account, CharacterDefinition, ClassDefinition, ItemDefinition, ItemId, TeamDefinition, TeamId,
};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("unknown {0}")]
    UnknownTeam(TeamId),

    #[error("unknown character {0}")]
    UnknownCharacter(CharacterId),

    #[error("unknown {0}")]
    UnknownClass(ClassId),

    #[error("unknown {0}")]
    UnknownItem(ItemId),

    #[error(transparent)]
    Placement(#[from] PlacementError),
}

/// A team member with fully resolved stats, ready to be seated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregatedMember {
    pub state: CharacterState,
    pub slot: Slot,
}

/// Every content record, indexed by id.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    classes: HashMap<ClassId, ClassDefinition>,
    items: HashMap<ItemId, ItemDefinition>,
    skills: Arc<SkillBook>,
    characters: HashMap<CharacterId, CharacterDefinition>,
    teams: HashMap<TeamId, TeamDefinition>,
    accounts: HashMap<String, Account>,
}

impl Catalog {
    pub fn new(
        classes: Vec<ClassDefinition>,
        items: Vec<ItemDefinition>,
        skills: Vec<SkillDefinition>,
        characters: Vec<CharacterDefinition>,
        teams: Vec<TeamDefinition>,
        accounts: Vec<Account>,
    ) -> Self {
        Self {
            classes: classes.into_iter().map(|class| (class.id, class)).collect(),
            items: items.into_iter().map(|item| (item.id, item)).collect(),
            skills: Arc::new(skills.into_iter().collect()),
            characters: characters.into_iter().map(|character| (character.id, character)).collect(),
            teams: teams.into_iter().map(|team| (team.id, team)).collect(),
            accounts: accounts
                .into_iter()
                .map(|account| (account.username.clone(), account))
                .collect(),
        }
    }

    /// Checks every cross reference and skill definition.
    pub fn validate(&self) -> anyhow::Result<()> {
        for skill in self.skills.iter() {
            if let Err(reason) = skill.check() {
                bail!("skill {} ({}): {reason}", skill.id, skill.name);
            }
        }

        for character in self.characters.values() {
            let context = || format!("character {} ({})", character.id, character.name);
            if !self.classes.contains_key(&character.class) {
                return Err(ContentError::UnknownClass(character.class)).with_context(context);
            }
            let missing = character.equipment.iter().find(|id| !self.items.contains_key(*id));
            if let Some(item) = missing {
                return Err(ContentError::UnknownItem(*item)).with_context(context);
            }
            if let Some(skill) = character.skills.iter().find(|id| !self.skills.contains(**id)) {
                bail!("{}: unknown {skill}", context());
            }
        }

        for team in self.teams.values() {
            if team.members.is_empty() {
                bail!("{} ({}) has no members", team.id, team.name);
            }
            if let Some(member) = team
                .members
                .iter()
                .find(|member| !self.characters.contains_key(&member.character))
            {
                return Err(ContentError::UnknownCharacter(member.character))
                    .with_context(|| format!("{} ({})", team.id, team.name));
            }
        }
        Ok(())
    }

    pub fn skills(&self) -> Arc<SkillBook> {
        Arc::clone(&self.skills)
    }

    pub fn class(&self, id: ClassId) -> Option<&ClassDefinition> {
        self.classes.get(&id)
    }

    pub fn item(&self, id: ItemId) -> Option<&ItemDefinition> {
        self.items.get(&id)
    }

    pub fn character(&self, id: CharacterId) -> Option<&CharacterDefinition> {
        self.characters.get(&id)
    }

    pub fn team(&self, id: TeamId) -> Option<&TeamDefinition> {
        self.teams.get(&id)
    }

    pub fn account(&self, username: &str) -> Option<&Account> {
        self.accounts.get(username)
    }

    /// Account matching both username and password.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<&Account> {
        self.account(username)
            .filter(|account| account.password == password)
    }

    /// Team `id` if it belongs to `owner`.
    pub fn team_for(&self, owner: &str, id: TeamId) -> Option<&TeamDefinition> {
        self.team(id).filter(|team| team.owner == owner)
    }

    /// Resolves a character's stats: class base plus every equipped item.
    ///
    /// Health and mana start full and cannot be healed past their aggregate.
    pub fn aggregate_character(
        &self,
        id: CharacterId,
        side: Side,
    ) -> Result<CharacterState, ContentError> {
        let definition = self.character(id).ok_or(ContentError::UnknownCharacter(id))?;
        let class = self
            .class(definition.class)
            .ok_or(ContentError::UnknownClass(definition.class))?;

        let mut totals = class.stats.clone();
        let mut armor = class.armor;
        let mut ward = class.ward;
        for item_id in &definition.equipment {
            let item = self.item(*item_id).ok_or(ContentError::UnknownItem(*item_id))?;
            for (stat, value) in &item.stats {
                *totals.entry(*stat).or_insert(0) += value;
            }
            armor = item.armor.unwrap_or(armor);
            ward = item.ward.unwrap_or(ward);
        }

        let state = totals.into_iter().fold(
            CharacterState::new(definition.id, definition.name.clone(), side, definition.class),
            |state, (stat, value)| {
                let stat_value = match stat {
                    StatKind::Health | StatKind::Mana | StatKind::Ki => Stat::full(value),
                    _ => Stat::new(value),
                };
                state.with_stat(stat, stat_value)
            },
        );

        Ok(state
            .with_armor(armor, ward)
            .with_skills(definition.skills.iter().copied()))
    }

    /// Resolves every member of a team for `side`, with its grid slot.
    pub fn aggregate_team(
        &self,
        id: TeamId,
        side: Side,
    ) -> Result<Vec<AggregatedMember>, ContentError> {
        let team = self.team(id).ok_or(ContentError::UnknownTeam(id))?;
        team.members
            .iter()
            .map(|member| {
                Ok(AggregatedMember {
                    state: self.aggregate_character(member.character, side)?,
                    slot: Slot::new(side, member.row, member.column),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use duel_core::{ArmorType, DamageType, SkillId, SkillKind, TargetingMode};

    use super::*;
    use crate::model::{ItemSlot, TeamMember};

    fn catalog() -> Catalog {
        Catalog::new(
            vec![ClassDefinition {
                id: ClassId(1),
                name: "Knight".into(),
                stats: BTreeMap::from([(StatKind::Health, 120), (StatKind::Strength, 12)]),
                armor: ArmorType::Medium,
                ward: ArmorType::Unarmored,
            }],
            vec![ItemDefinition {
                id: ItemId(5),
                name: "Plate".into(),
                slot: ItemSlot::Armor,
                stats: BTreeMap::from([(StatKind::Health, 30), (StatKind::Defense, 8)]),
                armor: Some(ArmorType::Heavy),
                ward: None,
            }],
            vec![
                SkillDefinition::new(SkillId(1), "Cleave", SkillKind::Strike, TargetingMode::Row)
                    .with_damage(DamageType::Slash, 8),
            ],
            vec![CharacterDefinition {
                id: CharacterId(10),
                name: "Aldric".into(),
                class: ClassId(1),
                equipment: vec![ItemId(5)],
                skills: vec![SkillId(1)],
            }],
            vec![TeamDefinition {
                id: TeamId(1),
                name: "Vanguard".into(),
                owner: "ada".into(),
                members: vec![TeamMember {
                    character: CharacterId(10),
                    row: 0,
                    column: 1,
                }],
            }],
            vec![Account {
                username: "ada".into(),
                password: "lovelace".into(),
                games_played: 3,
            }],
        )
    }

    #[test]
    fn aggregation_sums_class_and_equipment() {
        let catalog = catalog();
        let members = catalog.aggregate_team(TeamId(1), Side::Two).unwrap();
        assert_eq!(members.len(), 1);

        let member = &members[0];
        assert_eq!(member.slot, Slot::new(Side::Two, 0, 1));
        let state = &member.state;
        assert!(state.is_alive());
        assert_eq!(state.side(), Side::Two);
        assert_eq!(state.stat_entry(StatKind::Health), Some(Stat::full(150)));
        assert_eq!(state.stat(StatKind::Strength), 12);
        assert_eq!(state.stat(StatKind::Defense), 8);
        assert_eq!(state.armor_type(DamageType::Blunt), ArmorType::Heavy);
        assert_eq!(state.skills(), &[SkillId(1)]);
    }

    #[test]
    fn lookups_respect_ownership_and_credentials() {
        let catalog = catalog();
        assert!(catalog.authenticate("ada", "lovelace").is_some());
        assert!(catalog.authenticate("ada", "babbage").is_none());
        assert!(catalog.team_for("ada", TeamId(1)).is_some());
        assert!(catalog.team_for("bob", TeamId(1)).is_none());
        assert_eq!(
            catalog.aggregate_team(TeamId(2), Side::One).unwrap_err(),
            ContentError::UnknownTeam(TeamId(2))
        );
    }

    #[test]
    fn validation_catches_dangling_references() {
        let mut catalog = catalog();
        catalog.validate().unwrap();

        if let Some(character) = catalog.characters.get_mut(&CharacterId(10)) {
            character.equipment.push(ItemId(99));
        }
        let error = catalog.validate().unwrap_err();
        assert!(error.to_string().contains("Aldric"));
    }
}

//! Content factory that builds a [`Catalog`] from a data directory.

use std::path::{Path, PathBuf};

use duel_core::SkillDefinition;

use crate::catalog::Catalog;
use crate::loaders::{LoadResult, load_list};
use crate::model::{Account, CharacterDefinition, ClassDefinition, ItemDefinition, TeamDefinition};

/// Loads every content file from one directory.
///
/// ```text
/// data_dir/
/// ├── classes.ron
/// ├── items.ron
/// ├── skills.ron
/// ├── characters.ron
/// ├── teams.ron
/// └── accounts.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn load_classes(&self) -> LoadResult<Vec<ClassDefinition>> {
        load_list(&self.data_dir.join("classes.ron"))
    }

    pub fn load_items(&self) -> LoadResult<Vec<ItemDefinition>> {
        load_list(&self.data_dir.join("items.ron"))
    }

    pub fn load_skills(&self) -> LoadResult<Vec<SkillDefinition>> {
        load_list(&self.data_dir.join("skills.ron"))
    }

    pub fn load_characters(&self) -> LoadResult<Vec<CharacterDefinition>> {
        load_list(&self.data_dir.join("characters.ron"))
    }

    pub fn load_teams(&self) -> LoadResult<Vec<TeamDefinition>> {
        load_list(&self.data_dir.join("teams.ron"))
    }

    pub fn load_accounts(&self) -> LoadResult<Vec<Account>> {
        load_list(&self.data_dir.join("accounts.ron"))
    }

    /// Loads and cross-checks the whole catalog.
    pub fn load_catalog(&self) -> LoadResult<Catalog> {
        let catalog = Catalog::new(
            self.load_classes()?,
            self.load_items()?,
            self.load_skills()?,
            self.load_characters()?,
            self.load_teams()?,
            self.load_accounts()?,
        );
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

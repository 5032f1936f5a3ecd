//! Content collaborators consulted by the lobby.
//!
//! Rooms never touch these directly: a room is built from the team snapshots
//! the oracles returned at selection time, plus the shared skill book.
mod catalog;

use std::sync::Arc;

use async_trait::async_trait;
use duel_content::TeamId;
use duel_core::SkillBook;

use crate::api::OracleError;
use crate::types::{PlayerSummary, TeamSnapshot};

pub use catalog::CatalogOracle;

#[async_trait]
pub trait AccountOracle: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str)
    -> Result<PlayerSummary, OracleError>;
}

#[async_trait]
pub trait TeamOracle: Send + Sync {
    /// Resolves `owner`'s team with fully aggregated character stats.
    async fn team(&self, owner: &str, team: TeamId) -> Result<TeamSnapshot, OracleError>;

    fn skills(&self) -> Arc<SkillBook>;
}

/// Bundles the oracles a lobby needs.
#[derive(Clone)]
pub struct OracleManager {
    pub(crate) accounts: Arc<dyn AccountOracle>,
    pub(crate) teams: Arc<dyn TeamOracle>,
}

impl OracleManager {
    pub fn new(accounts: Arc<dyn AccountOracle>, teams: Arc<dyn TeamOracle>) -> Self {
        Self { accounts, teams }
    }

    /// Serves both accounts and teams from one content catalog.
    pub fn from_catalog(catalog: Arc<duel_content::Catalog>) -> Self {
        let oracle = Arc::new(CatalogOracle::new(catalog));
        Self {
            accounts: oracle.clone(),
            teams: oracle,
        }
    }

    pub fn accounts(&self) -> &dyn AccountOracle {
        self.accounts.as_ref()
    }

    pub fn teams(&self) -> &dyn TeamOracle {
        self.teams.as_ref()
    }
}

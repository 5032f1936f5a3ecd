use std::sync::Arc;

use async_trait::async_trait;
use duel_content::{Catalog, TeamId};
use duel_core::{Side, SkillBook};

use super::{AccountOracle, TeamOracle};
use crate::api::OracleError;
use crate::types::{PlayerSummary, TeamSnapshot};

/// Oracle backed by an in-memory [`Catalog`].
#[derive(Clone, Debug)]
pub struct CatalogOracle {
    catalog: Arc<Catalog>,
}

impl CatalogOracle {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl AccountOracle for CatalogOracle {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<PlayerSummary, OracleError> {
        let account = self
            .catalog
            .authenticate(username, password)
            .ok_or(OracleError::InvalidCredentials)?;
        Ok(PlayerSummary {
            username: account.username.clone(),
            games_played: account.games_played,
        })
    }
}

#[async_trait]
impl TeamOracle for CatalogOracle {
    async fn team(&self, owner: &str, team: TeamId) -> Result<TeamSnapshot, OracleError> {
        let definition = self.catalog.team(team).ok_or(OracleError::UnknownTeam(team))?;
        if definition.owner != owner {
            return Err(OracleError::NotOwner {
                team,
                owner: owner.to_string(),
            });
        }
        // Rooms re-seat members on their actual side.
        let members = self.catalog.aggregate_team(team, Side::One)?;
        Ok(TeamSnapshot {
            id: team,
            name: definition.name.clone(),
            members,
        })
    }

    fn skills(&self) -> Arc<SkillBook> {
        self.catalog.skills()
    }
}

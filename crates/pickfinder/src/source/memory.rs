use common::error::StoreError;
use common::types::{Game, Player, PlayerGameStat, Prediction, Team, TeamRating};
use std::sync::atomic::{AtomicU32, Ordering};

use super::PickDataSource;

/// In-memory store for engine tests. Queries mirror the SQLite filters.
#[derive(Debug, Default)]
pub struct MemorySource {
    pub games: Vec<Game>,
    pub players: Vec<Player>,
    pub stats: Vec<PlayerGameStat>,
    pub predictions: Vec<Prediction>,
    pub teams: Vec<Team>,
    pub ratings: Vec<TeamRating>,
    pub fail_ratings: bool,
    pub fail_predictions: bool,
    pub stats_pages_served: AtomicU32,
}

fn store_down(op: &'static str) -> StoreError {
    StoreError::Connection(format!("{op}: backend unavailable"))
}

impl PickDataSource for MemorySource {
    async fn fetch_upcoming_games(&self, limit: u32) -> Result<Vec<Game>, StoreError> {
        let mut games: Vec<Game> = self
            .games
            .iter()
            .filter(|g| g.status.is_pending())
            .cloned()
            .collect();
        games.sort_by(|a, b| a.game_date.cmp(&b.game_date).then(a.id.cmp(&b.id)));
        games.truncate(limit as usize);
        Ok(games)
    }

    async fn fetch_active_players(&self, team_ids: &[i64]) -> Result<Vec<Player>, StoreError> {
        Ok(self
            .players
            .iter()
            .filter(|p| p.is_active && team_ids.contains(&p.team_id))
            .cloned()
            .collect())
    }

    async fn fetch_predictions(
        &self,
        game_ids: &[i64],
        model_versions: &[String],
    ) -> Result<Vec<Prediction>, StoreError> {
        if self.fail_predictions {
            return Err(store_down("predictions"));
        }
        Ok(self
            .predictions
            .iter()
            .filter(|p| game_ids.contains(&p.game_id) && model_versions.contains(&p.model_version))
            .cloned()
            .collect())
    }

    async fn fetch_player_stats_page(
        &self,
        player_ids: &[i64],
        limit: u32,
        offset: u32,
    ) -> Result<Vec<PlayerGameStat>, StoreError> {
        self.stats_pages_served.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .stats
            .iter()
            .filter(|s| player_ids.contains(&s.player_id))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn fetch_games(&self, game_ids: &[i64]) -> Result<Vec<Game>, StoreError> {
        Ok(self
            .games
            .iter()
            .filter(|g| game_ids.contains(&g.id))
            .cloned()
            .collect())
    }

    async fn fetch_teams(&self, team_ids: &[i64]) -> Result<Vec<Team>, StoreError> {
        Ok(self
            .teams
            .iter()
            .filter(|t| team_ids.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn fetch_team_ratings(&self, season: &str) -> Result<Vec<TeamRating>, StoreError> {
        if self.fail_ratings {
            return Err(store_down("team_ratings"));
        }
        Ok(self
            .ratings
            .iter()
            .filter(|r| r.season == season)
            .cloned()
            .collect())
    }
}

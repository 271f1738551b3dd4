//! Read-only query shapes the finder needs from the tabular store.

use common::error::StoreError;
use common::types::{Game, Player, PlayerGameStat, Prediction, Team, TeamRating};
use std::future::Future;

#[cfg(test)]
pub mod memory;
pub mod sqlite;

pub trait PickDataSource {
    /// Scheduled, upcoming or live games, earliest first.
    fn fetch_upcoming_games(
        &self,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<Game>, StoreError>> + Send;

    fn fetch_active_players(
        &self,
        team_ids: &[i64],
    ) -> impl Future<Output = Result<Vec<Player>, StoreError>> + Send;

    fn fetch_predictions(
        &self,
        game_ids: &[i64],
        model_versions: &[String],
    ) -> impl Future<Output = Result<Vec<Prediction>, StoreError>> + Send;

    /// One page of historical box scores, in a stable order. A page shorter than `limit`
    /// is the last one.
    fn fetch_player_stats_page(
        &self,
        player_ids: &[i64],
        limit: u32,
        offset: u32,
    ) -> impl Future<Output = Result<Vec<PlayerGameStat>, StoreError>> + Send;

    fn fetch_games(
        &self,
        game_ids: &[i64],
    ) -> impl Future<Output = Result<Vec<Game>, StoreError>> + Send;

    fn fetch_teams(
        &self,
        team_ids: &[i64],
    ) -> impl Future<Output = Result<Vec<Team>, StoreError>> + Send;

    /// Ratings for every team of the season, so ranks are league-wide.
    fn fetch_team_ratings(
        &self,
        season: &str,
    ) -> impl Future<Output = Result<Vec<TeamRating>, StoreError>> + Send;
}

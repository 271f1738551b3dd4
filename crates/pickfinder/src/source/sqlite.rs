use chrono::NaiveDate;
use common::db::{placeholders, AsyncDb};
use common::error::StoreError;
use common::types::{
    Game, GameStatus, GameType, Player, PlayerGameStat, Prediction, Team, TeamRating,
};
use rusqlite::types::Value;
use rusqlite::params_from_iter;

use super::PickDataSource;

/// Game row as stored; text columns are validated after the query.
struct RawGame {
    id: i64,
    game_date: String,
    home_team_id: i64,
    away_team_id: i64,
    status: String,
    season: String,
    game_type: String,
}

fn parse_game(raw: RawGame) -> Result<Game, StoreError> {
    // Timestamps are accepted; only the calendar day matters.
    let day = raw.game_date.get(..10).unwrap_or(&raw.game_date);
    let game_date = NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| {
        StoreError::invalid_row("games", format!("game {} date {:?}: {e}", raw.id, raw.game_date))
    })?;
    let status = GameStatus::from_str_loose(&raw.status).ok_or_else(|| {
        StoreError::invalid_row("games", format!("game {} status {:?}", raw.id, raw.status))
    })?;
    let game_type = GameType::from_str_loose(&raw.game_type).ok_or_else(|| {
        StoreError::invalid_row(
            "games",
            format!("game {} game_type {:?}", raw.id, raw.game_type),
        )
    })?;
    Ok(Game {
        id: raw.id,
        game_date,
        home_team_id: raw.home_team_id,
        away_team_id: raw.away_team_id,
        status,
        season: raw.season,
        game_type,
    })
}

const GAME_COLUMNS: &str = "id, game_date, home_team_id, away_team_id, status, season, game_type";

fn read_game(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawGame> {
    Ok(RawGame {
        id: row.get(0)?,
        game_date: row.get(1)?,
        home_team_id: row.get(2)?,
        away_team_id: row.get(3)?,
        status: row.get(4)?,
        season: row.get(5)?,
        game_type: row.get(6)?,
    })
}

/// Every spelling `GameStatus::from_str_loose` reads as pending, lowercased.
const PENDING_STATUSES: &str = "'scheduled', 'upcoming', 'live', 'in_progress'";

fn id_values(ids: &[i64]) -> Vec<Value> {
    ids.iter().copied().map(Value::Integer).collect()
}

/// Missing box-score numbers count as zero.
fn stat_or_zero(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<f64> {
    Ok(row.get::<_, Option<f64>>(idx)?.unwrap_or(0.0))
}

impl PickDataSource for AsyncDb {
    async fn fetch_upcoming_games(&self, limit: u32) -> Result<Vec<Game>, StoreError> {
        let raw = self
            .call_named("upcoming_games", move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {GAME_COLUMNS}
                     FROM games
                     WHERE lower(trim(status)) IN ({PENDING_STATUSES})
                     ORDER BY game_date ASC, id ASC
                     LIMIT ?1"
                ))?;
                let rows = stmt.query_map([limit], read_game)?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await?;
        raw.into_iter().map(parse_game).collect()
    }

    async fn fetch_active_players(&self, team_ids: &[i64]) -> Result<Vec<Player>, StoreError> {
        if team_ids.is_empty() {
            return Ok(Vec::new());
        }
        let params = id_values(team_ids);
        self.call_named("active_players", move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT id, full_name, position, team_id
                 FROM players
                 WHERE is_active = 1 AND team_id IN ({})
                 ORDER BY id",
                placeholders(1, params.len())
            ))?;
            let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
                Ok(Player {
                    id: row.get(0)?,
                    full_name: row.get(1)?,
                    position: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    team_id: row.get(3)?,
                    is_active: true,
                })
            })?;
            rows.collect()
        })
        .await
    }

    async fn fetch_predictions(
        &self,
        game_ids: &[i64],
        model_versions: &[String],
    ) -> Result<Vec<Prediction>, StoreError> {
        if game_ids.is_empty() || model_versions.is_empty() {
            return Ok(Vec::new());
        }
        let mut params = id_values(game_ids);
        let models_from = params.len() + 1;
        params.extend(model_versions.iter().cloned().map(Value::Text));
        let game_count = game_ids.len();
        let model_count = model_versions.len();
        self.call_named("predictions", move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT player_id, game_id, model_version,
                        predicted_points, predicted_rebounds, predicted_assists,
                        predicted_steals, predicted_blocks, predicted_turnovers,
                        predicted_three_pointers_made, confidence_score
                 FROM predictions
                 WHERE game_id IN ({}) AND model_version IN ({})
                 ORDER BY player_id, model_version",
                placeholders(1, game_count),
                placeholders(models_from, model_count)
            ))?;
            let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
                Ok(Prediction {
                    player_id: row.get(0)?,
                    game_id: row.get(1)?,
                    model_version: row.get(2)?,
                    points: stat_or_zero(row, 3)?,
                    rebounds: stat_or_zero(row, 4)?,
                    assists: stat_or_zero(row, 5)?,
                    steals: stat_or_zero(row, 6)?,
                    blocks: stat_or_zero(row, 7)?,
                    turnovers: stat_or_zero(row, 8)?,
                    three_pointers_made: stat_or_zero(row, 9)?,
                    confidence: stat_or_zero(row, 10)?,
                })
            })?;
            rows.collect()
        })
        .await
    }

    async fn fetch_player_stats_page(
        &self,
        player_ids: &[i64],
        limit: u32,
        offset: u32,
    ) -> Result<Vec<PlayerGameStat>, StoreError> {
        if player_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut params = id_values(player_ids);
        let n = params.len();
        params.push(Value::Integer(i64::from(limit)));
        params.push(Value::Integer(i64::from(offset)));
        self.call_named("player_stats_page", move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT player_id, game_id, team_id, points, rebounds, assists, steals,
                        blocks, turnovers, three_pointers_made, minutes
                 FROM player_game_stats
                 WHERE player_id IN ({})
                 ORDER BY id
                 LIMIT ?{} OFFSET ?{}",
                placeholders(1, n),
                n + 1,
                n + 2
            ))?;
            let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
                Ok(PlayerGameStat {
                    player_id: row.get(0)?,
                    game_id: row.get(1)?,
                    team_id: row.get(2)?,
                    points: stat_or_zero(row, 3)?,
                    rebounds: stat_or_zero(row, 4)?,
                    assists: stat_or_zero(row, 5)?,
                    steals: stat_or_zero(row, 6)?,
                    blocks: stat_or_zero(row, 7)?,
                    turnovers: stat_or_zero(row, 8)?,
                    three_pointers_made: stat_or_zero(row, 9)?,
                    minutes: stat_or_zero(row, 10)?,
                })
            })?;
            rows.collect()
        })
        .await
    }

    async fn fetch_games(&self, game_ids: &[i64]) -> Result<Vec<Game>, StoreError> {
        if game_ids.is_empty() {
            return Ok(Vec::new());
        }
        let params = id_values(game_ids);
        let raw = self
            .call_named("games", move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {GAME_COLUMNS} FROM games WHERE id IN ({})",
                    placeholders(1, params.len())
                ))?;
                let rows = stmt.query_map(params_from_iter(params.iter()), read_game)?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await?;
        raw.into_iter().map(parse_game).collect()
    }

    async fn fetch_teams(&self, team_ids: &[i64]) -> Result<Vec<Team>, StoreError> {
        if team_ids.is_empty() {
            return Ok(Vec::new());
        }
        let params = id_values(team_ids);
        self.call_named("teams", move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT id, full_name, abbreviation FROM teams WHERE id IN ({})",
                placeholders(1, params.len())
            ))?;
            let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
                Ok(Team {
                    id: row.get(0)?,
                    full_name: row.get(1)?,
                    abbreviation: row.get(2)?,
                })
            })?;
            rows.collect()
        })
        .await
    }

    async fn fetch_team_ratings(&self, season: &str) -> Result<Vec<TeamRating>, StoreError> {
        let season = season.to_string();
        self.call_named("team_ratings", move |conn| {
            let mut stmt = conn.prepare(
                "SELECT team_id, season, defensive_rating, pace
                 FROM team_ratings
                 WHERE season = ?1",
            )?;
            let rows = stmt.query_map([&season], |row| {
                Ok(TeamRating {
                    team_id: row.get(0)?,
                    season: row.get(1)?,
                    defensive_rating: row.get(2)?,
                    pace: row.get(3)?,
                })
            })?;
            rows.collect()
        })
        .await
    }
}

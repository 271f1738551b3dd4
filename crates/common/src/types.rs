use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Scheduled,
    Upcoming,
    Live,
    Completed,
    Postponed,
}

impl GameStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Upcoming => "upcoming",
            Self::Live => "live",
            Self::Completed => "completed",
            Self::Postponed => "postponed",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Some(Self::Scheduled),
            "upcoming" => Some(Self::Upcoming),
            "live" | "in_progress" => Some(Self::Live),
            "completed" | "final" => Some(Self::Completed),
            "postponed" => Some(Self::Postponed),
            _ => None,
        }
    }

    /// Statuses that make a game part of the next slate.
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Scheduled | Self::Upcoming | Self::Live)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    Preseason,
    RegularSeason,
    PlayIn,
    Playoffs,
}

impl GameType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preseason => "preseason",
            Self::RegularSeason => "regular_season",
            Self::PlayIn => "play_in",
            Self::Playoffs => "playoffs",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "preseason" => Some(Self::Preseason),
            "regular_season" | "regular" => Some(Self::RegularSeason),
            "play_in" | "playin" => Some(Self::PlayIn),
            "playoffs" | "playoff" => Some(Self::Playoffs),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: i64,
    pub game_date: NaiveDate,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub status: GameStatus,
    pub season: String,
    pub game_type: GameType,
}

impl Game {
    pub fn is_home(&self, team_id: i64) -> bool {
        self.home_team_id == team_id
    }

    /// Opponent of `team_id` in this game, from that team's point of view.
    pub fn opponent_of(&self, team_id: i64) -> i64 {
        if self.is_home(team_id) {
            self.away_team_id
        } else {
            self.home_team_id
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionBucket {
    C,
    F,
    G,
}

impl PositionBucket {
    /// Buckets a free-text position by its primary (first listed) position.
    pub fn from_position(raw: &str) -> Self {
        let primary = raw
            .split(['-', '/', ','])
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_uppercase();
        match primary.as_str() {
            "C" | "CENTER" => Self::C,
            "F" | "PF" | "SF" | "FORWARD" | "POWER FORWARD" | "SMALL FORWARD" => Self::F,
            _ => Self::G,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub full_name: String,
    pub position: String,
    pub team_id: i64,
    pub is_active: bool,
}

impl Player {
    pub fn position_bucket(&self) -> PositionBucket {
        PositionBucket::from_position(&self.position)
    }
}

/// One box-score line for a player in a completed game. `team_id` is the
/// team the player suited up for in that game, so trades are handled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameStat {
    pub player_id: i64,
    pub game_id: i64,
    pub team_id: i64,
    pub points: f64,
    pub rebounds: f64,
    pub assists: f64,
    pub steals: f64,
    pub blocks: f64,
    pub turnovers: f64,
    pub three_pointers_made: f64,
    pub minutes: f64,
}

/// One model's prediction for a player in a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub player_id: i64,
    pub game_id: i64,
    pub model_version: String,
    pub points: f64,
    pub rebounds: f64,
    pub assists: f64,
    pub steals: f64,
    pub blocks: f64,
    pub turnovers: f64,
    pub three_pointers_made: f64,
    /// 0..=100
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub full_name: String,
    pub abbreviation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRating {
    pub team_id: i64,
    pub season: String,
    /// Points allowed per 100 possessions; lower is better.
    pub defensive_rating: Option<f64>,
    pub pace: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatType {
    Points,
    Rebounds,
    Assists,
    Steals,
    Blocks,
    Turnovers,
    #[serde(alias = "threes", alias = "3pm")]
    ThreePointersMade,
}

impl StatType {
    pub const ALL: [StatType; 7] = [
        Self::Points,
        Self::Rebounds,
        Self::Assists,
        Self::Steals,
        Self::Blocks,
        Self::Turnovers,
        Self::ThreePointersMade,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Points => "points",
            Self::Rebounds => "rebounds",
            Self::Assists => "assists",
            Self::Steals => "steals",
            Self::Blocks => "blocks",
            Self::Turnovers => "turnovers",
            Self::ThreePointersMade => "three_pointers_made",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "points" | "pts" => Some(Self::Points),
            "rebounds" | "reb" => Some(Self::Rebounds),
            "assists" | "ast" => Some(Self::Assists),
            "steals" | "stl" => Some(Self::Steals),
            "blocks" | "blk" => Some(Self::Blocks),
            "turnovers" | "tov" => Some(Self::Turnovers),
            "three_pointers_made" | "threes" | "3pm" => Some(Self::ThreePointersMade),
            _ => None,
        }
    }

    /// Short label used in human-readable pick reasons.
    pub fn label(self) -> &'static str {
        match self {
            Self::Points => "PTS",
            Self::Rebounds => "REB",
            Self::Assists => "AST",
            Self::Steals => "STL",
            Self::Blocks => "BLK",
            Self::Turnovers => "TOV",
            Self::ThreePointersMade => "3PM",
        }
    }

    /// Buffer applied by the favorable line adjustment.
    pub fn favorable_buffer(self) -> f64 {
        match self {
            Self::Points => 2.0,
            Self::Rebounds | Self::Assists => 1.0,
            Self::Steals | Self::Blocks | Self::Turnovers | Self::ThreePointersMade => 0.5,
        }
    }

    pub fn actual(self, stat: &PlayerGameStat) -> f64 {
        match self {
            Self::Points => stat.points,
            Self::Rebounds => stat.rebounds,
            Self::Assists => stat.assists,
            Self::Steals => stat.steals,
            Self::Blocks => stat.blocks,
            Self::Turnovers => stat.turnovers,
            Self::ThreePointersMade => stat.three_pointers_made,
        }
    }
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

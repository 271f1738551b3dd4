use crate::types::StatType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Window value meaning "use the entire filtered history" for the minutes gate.
pub const WINDOW_ALL_GAMES: usize = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Over,
    Under,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Over => "over",
            Self::Under => "under",
        }
    }

    pub fn is_hit(self, value: f64, line: f64) -> bool {
        match self {
            Self::Over => value > line,
            Self::Under => value < line,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionSelection {
    Over,
    Under,
    Both,
}

impl DirectionSelection {
    pub fn directions(self) -> Vec<Direction> {
        match self {
            Self::Over => vec![Direction::Over],
            Self::Under => vec![Direction::Under],
            Self::Both => vec![Direction::Over, Direction::Under],
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "over" => Some(Self::Over),
            "under" => Some(Self::Under),
            "both" => Some(Self::Both),
            _ => None,
        }
    }
}

/// A single stat type or every stat type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StatSelection {
    All,
    Single(StatType),
}

impl StatSelection {
    pub fn stat_types(self) -> Vec<StatType> {
        match self {
            Self::All => StatType::ALL.to_vec(),
            Self::Single(stat) => vec![stat],
        }
    }
}

impl TryFrom<String> for StatSelection {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        StatType::from_str_loose(&value)
            .map(Self::Single)
            .ok_or_else(|| format!("unknown stat type: {value}"))
    }
}

impl From<StatSelection> for String {
    fn from(value: StatSelection) -> Self {
        match value {
            StatSelection::All => "all".to_string(),
            StatSelection::Single(stat) => stat.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineMethod {
    PlayerAverage,
    AiPrediction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineAdjustment {
    Standard,
    Favorable,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HitRateMode {
    Percentage,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AiAgreement {
    Disabled,
    Simple,
    Strong,
    VeryStrong,
}

impl AiAgreement {
    /// Whether an AI margin (positive = prediction agrees with the pick) clears this level.
    pub fn accepts(self, margin: f64) -> bool {
        match self {
            Self::Disabled => true,
            Self::Simple => margin > 0.0,
            Self::Strong => margin >= 2.0,
            Self::VeryStrong => margin >= 4.0,
        }
    }
}

/// An optional filter: when `enabled` is false the threshold imposes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gate<T> {
    pub enabled: bool,
    pub threshold: T,
}

impl<T: Copy> Gate<T> {
    pub fn on(threshold: T) -> Self {
        Self {
            enabled: true,
            threshold,
        }
    }

    pub fn off(threshold: T) -> Self {
        Self {
            enabled: false,
            threshold,
        }
    }

    pub fn active(&self) -> Option<T> {
        self.enabled.then_some(self.threshold)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitRateGate {
    pub enabled: bool,
    pub threshold: f64,
    pub mode: HitRateMode,
}

impl HitRateGate {
    pub fn accepts(&self, hit_rate_pct: f64, hit_count: u32) -> bool {
        if !self.enabled {
            return true;
        }
        match self.mode {
            HitRateMode::Percentage => hit_rate_pct >= self.threshold,
            HitRateMode::Count => f64::from(hit_count) >= self.threshold,
        }
    }
}

/// Per-stat offsets for the custom line adjustment. Unset stats default to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomLineModifiers {
    pub points: f64,
    pub rebounds: f64,
    pub assists: f64,
    pub steals: f64,
    pub blocks: f64,
    pub turnovers: f64,
    pub three_pointers_made: f64,
}

impl CustomLineModifiers {
    pub fn get(&self, stat: StatType) -> f64 {
        match stat {
            StatType::Points => self.points,
            StatType::Rebounds => self.rebounds,
            StatType::Assists => self.assists,
            StatType::Steals => self.steals,
            StatType::Blocks => self.blocks,
            StatType::Turnovers => self.turnovers,
            StatType::ThreePointersMade => self.three_pointers_made,
        }
    }
}

/// Caller-supplied search configuration. Never persisted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickFinderFilters {
    pub stat_type: StatSelection,
    pub over_under: DirectionSelection,
    pub line_method: LineMethod,
    pub line_adjustment: LineAdjustment,
    pub custom_line_modifiers: CustomLineModifiers,

    pub time_window: usize,
    pub context_time_window: usize,
    pub h2h_time_window: usize,
    /// `WINDOW_ALL_GAMES` averages minutes over the whole history.
    pub minutes_window: usize,

    pub hit_rate: HitRateGate,

    /// Compare home games to home games and road games to road games.
    pub use_context: bool,
    pub context_hit_rate: Gate<f64>,
    pub context_consecutive: Gate<u32>,

    pub use_h2h: bool,
    pub h2h_hit_rate: Gate<f64>,
    pub h2h_consecutive: Gate<u32>,

    pub consecutive: Gate<u32>,
    pub min_minutes: Gate<f64>,
    pub min_confidence: Gate<f64>,
    pub ai_agreement: AiAgreement,

    /// Playoff slates only look at playoff history, regular-season slates at
    /// regular-season history.
    pub separate_playoff_stats: bool,
}

impl Default for PickFinderFilters {
    fn default() -> Self {
        Self {
            stat_type: StatSelection::Single(StatType::Points),
            over_under: DirectionSelection::Over,
            line_method: LineMethod::PlayerAverage,
            line_adjustment: LineAdjustment::Standard,
            custom_line_modifiers: CustomLineModifiers::default(),
            time_window: 10,
            context_time_window: 10,
            h2h_time_window: 5,
            minutes_window: 10,
            hit_rate: HitRateGate {
                enabled: true,
                threshold: 70.0,
                mode: HitRateMode::Percentage,
            },
            use_context: false,
            context_hit_rate: Gate::off(60.0),
            context_consecutive: Gate::off(3),
            use_h2h: false,
            h2h_hit_rate: Gate::off(60.0),
            h2h_consecutive: Gate::off(2),
            consecutive: Gate::off(3),
            min_minutes: Gate::off(20.0),
            min_confidence: Gate::off(60.0),
            ai_agreement: AiAgreement::Disabled,
            separate_playoff_stats: false,
        }
    }
}

impl PickFinderFilters {
    /// Every optional gate switched off. Only the structural checks remain.
    pub fn permissive() -> Self {
        Self {
            hit_rate: HitRateGate {
                enabled: false,
                ..Self::default().hit_rate
            },
            ..Self::default()
        }
    }

    /// Copy of these filters narrowed to one stat type and one direction.
    pub fn for_pass(&self, stat: StatType, direction: Direction) -> Self {
        let over_under = match direction {
            Direction::Over => DirectionSelection::Over,
            Direction::Under => DirectionSelection::Under,
        };
        Self {
            stat_type: StatSelection::Single(stat),
            over_under,
            ..self.clone()
        }
    }
}

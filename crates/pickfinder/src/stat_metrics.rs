use common::filters::{CustomLineModifiers, Direction, LineAdjustment, LineMethod};
use common::types::StatType;
use serde::Serialize;

/// A line is never zero or negative.
pub const MIN_LINE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HitRate {
    /// Percent, 0..=100.
    pub hit_rate: f64,
    pub hit_count: u32,
    pub total_games: u32,
}

impl HitRate {
    pub const EMPTY: HitRate = HitRate {
        hit_rate: 0.0,
        hit_count: 0,
        total_games: 0,
    };
}

fn round_to_half(x: f64) -> f64 {
    (x * 2.0).round() / 2.0
}

/// Derive the betting line for one stat/direction.
///
/// `Standard` rounds to the nearest 0.5. The other adjustments shift the baseline in the
/// bettor's favor and then truncate toward the bettor (floor for over, ceil for under) so
/// rounding never gives the buffer back.
pub fn calculate_line(
    season_avg: f64,
    ai_prediction: f64,
    line_method: LineMethod,
    line_adjustment: LineAdjustment,
    direction: Direction,
    stat: StatType,
    custom_modifiers: Option<&CustomLineModifiers>,
) -> f64 {
    let base = match line_method {
        LineMethod::PlayerAverage => season_avg,
        LineMethod::AiPrediction => ai_prediction,
    };

    let offset = match line_adjustment {
        LineAdjustment::Standard => 0.0,
        LineAdjustment::Favorable => stat.favorable_buffer(),
        LineAdjustment::Custom => custom_modifiers.map_or(0.0, |m| m.get(stat)),
    };
    let shifted = match direction {
        Direction::Over => base - offset,
        Direction::Under => base + offset,
    };

    let line = match (line_adjustment, direction) {
        (LineAdjustment::Standard, _) => round_to_half(shifted),
        (_, Direction::Over) => (shifted * 2.0).floor() / 2.0,
        (_, Direction::Under) => (shifted * 2.0).ceil() / 2.0,
    };
    line.max(MIN_LINE)
}

/// Ties never count as hits.
pub fn calculate_hit_rate(values: &[f64], line: f64, direction: Direction) -> HitRate {
    if values.is_empty() {
        return HitRate::EMPTY;
    }
    let hit_count = values
        .iter()
        .filter(|v| direction.is_hit(**v, line))
        .count() as u32;
    let total_games = values.len() as u32;
    HitRate {
        hit_rate: f64::from(hit_count) / f64::from(total_games) * 100.0,
        hit_count,
        total_games,
    }
}

/// `values` are ordered oldest to newest. Counts hits from the newest game backward
/// until the first miss.
pub fn calculate_consecutive_hits(values: &[f64], line: f64, direction: Direction) -> u32 {
    values
        .iter()
        .rev()
        .take_while(|v| direction.is_hit(**v, line))
        .count() as u32
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StrengthInput {
    /// Overall hit rate, percent.
    pub hit_rate: f64,
    /// Home/away split hit rate, percent.
    pub context_hit_rate: Option<f64>,
    /// Prediction minus line in the pick's favor, stat units.
    pub ai_margin: f64,
    /// 0..=100
    pub confidence: f64,
    /// Opponent defensive rank, 1 = best defense.
    pub defense_rank: Option<u32>,
    pub pace_bonus: Option<f64>,
}

/// Per-term contributions, each rounded. Terms that did not apply are absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StrengthBreakdown {
    pub hit_rate: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_hit_rate: Option<u32>,
    pub ai_margin: u32,
    pub confidence: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defense: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pace: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrengthScore {
    /// 0..=100
    pub score: u32,
    pub breakdown: StrengthBreakdown,
}

const HIT_RATE_POINTS: f64 = 30.0;
const CONTEXT_HIT_RATE_POINTS: f64 = 15.0;
const AI_MARGIN_POINTS: f64 = 25.0;
const AI_MARGIN_SATURATION: f64 = 8.0;
const CONFIDENCE_POINTS: f64 = 15.0;
const DEFENSE_POINTS: f64 = 10.0;
const PACE_POINTS: f64 = 5.0;
const PACE_SATURATION: f64 = 10.0;

fn hit_rate_factor(pct: f64) -> f64 {
    ((pct - 50.0) / 50.0).max(0.0)
}

fn to_points(x: f64) -> u32 {
    x.round().max(0.0) as u32
}

pub fn calculate_strength_score(input: &StrengthInput) -> StrengthScore {
    let hit_rate = hit_rate_factor(input.hit_rate) * HIT_RATE_POINTS;
    let context = input
        .context_hit_rate
        .map(|pct| hit_rate_factor(pct) * CONTEXT_HIT_RATE_POINTS);
    let ai_margin = (input.ai_margin.abs() / AI_MARGIN_SATURATION).min(1.0) * AI_MARGIN_POINTS;
    let confidence = (input.confidence / 100.0).max(0.0) * CONFIDENCE_POINTS;
    // Rank is assumed to be in 1..=30; only the lower bound is enforced.
    let defense = input
        .defense_rank
        .map(|rank| ((31.0 - f64::from(rank)) / 30.0).max(0.0) * DEFENSE_POINTS);
    let pace = input
        .pace_bonus
        .map(|bonus| (bonus.max(0.0) / PACE_SATURATION).min(1.0) * PACE_POINTS);

    let sum = hit_rate
        + ai_margin
        + confidence
        + context.unwrap_or(0.0)
        + defense.unwrap_or(0.0)
        + pace.unwrap_or(0.0);

    StrengthScore {
        score: to_points(sum).min(100),
        breakdown: StrengthBreakdown {
            hit_rate: to_points(hit_rate),
            context_hit_rate: context.map(to_points),
            ai_margin: to_points(ai_margin),
            confidence: to_points(confidence),
            defense: defense.map(to_points),
            pace: pace.map(to_points),
        },
    }
}

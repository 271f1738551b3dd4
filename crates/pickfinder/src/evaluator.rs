use chrono::NaiveDate;
use common::filters::{Direction, PickFinderFilters, WINDOW_ALL_GAMES};
use common::types::{Game, Player, PositionBucket, StatType};
use serde::Serialize;
use thiserror::Error;

use crate::diagnostics::{Rejection, RejectionCounters};
use crate::history::{chronological_values, contextual_split, head_to_head_split, HistoryEntry};
use crate::predictions::AveragedPrediction;
use crate::stat_metrics::{
    calculate_consecutive_hits, calculate_hit_rate, calculate_line, calculate_strength_score,
    HitRate, StrengthBreakdown, StrengthInput,
};
use crate::teams::TeamDirectory;

/// Confidence at or above which a pick mentions it as a reason.
const HIGH_CONFIDENCE: f64 = 70.0;

#[derive(Debug, Error, PartialEq)]
pub enum EvaluationError {
    #[error("non-finite {field} for player {player_id} in game {game_id}")]
    NonFinite {
        player_id: i64,
        game_id: i64,
        field: &'static str,
    },
}

/// Hit statistics over one split of a player's history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SplitStats {
    #[serde(flatten)]
    pub hit_rate: HitRate,
    pub consecutive_hits: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickResult {
    pub player_id: i64,
    pub player_name: String,
    pub position: PositionBucket,
    pub team_id: i64,
    pub team_abbreviation: String,
    pub opponent_id: i64,
    pub opponent_abbreviation: String,
    pub game_id: i64,
    pub game_date: NaiveDate,
    pub is_home: bool,
    pub stat_type: StatType,
    pub direction: Direction,
    pub line: f64,
    pub season_average: f64,
    pub ai_prediction: f64,
    pub confidence: f64,
    pub ai_margin: f64,
    pub overall: SplitStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<SplitStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h2h: Option<SplitStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent_defense_rank: Option<u32>,
    pub strength_score: u32,
    pub strength_breakdown: StrengthBreakdown,
    pub reasons: Vec<String>,
}

/// Everything needed to judge one player for one game, stat and direction.
pub struct EvaluationInput<'a> {
    pub player: &'a Player,
    pub game: &'a Game,
    pub teams: &'a TeamDirectory,
    pub filters: &'a PickFinderFilters,
    /// Most recent game first.
    pub history: &'a [HistoryEntry],
    pub prediction: Option<&'a AveragedPrediction>,
    pub stat: StatType,
    pub direction: Direction,
}

fn rejected(
    counters: &mut Option<&mut RejectionCounters>,
    rejection: Rejection,
) -> Result<Option<PickResult>, EvaluationError> {
    if let Some(c) = counters.as_deref_mut() {
        c.record(rejection);
    }
    Ok(None)
}

fn mean(xs: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = xs.fold((0.0, 0_u32), |(s, n), x| (s + x, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / f64::from(n)
    }
}

/// Apply every enabled filter in order; the first failure rejects the pair and bumps
/// exactly one counter. Disabled filters never reject.
#[allow(clippy::too_many_lines)] // gate sequence reads top to bottom
pub fn evaluate_player_pick(
    input: &EvaluationInput<'_>,
    counters: Option<&mut RejectionCounters>,
) -> Result<Option<PickResult>, EvaluationError> {
    let mut counters = counters;
    let EvaluationInput {
        player,
        game,
        teams,
        filters: f,
        history,
        prediction,
        stat,
        direction,
    } = *input;

    if let Some(c) = counters.as_deref_mut() {
        c.evaluated += 1;
    }

    if history.is_empty() || history.len() < f.time_window.min(3) {
        return rejected(&mut counters, Rejection::InsufficientHistory);
    }

    let opponent_id = game.opponent_of(player.team_id);
    let (Some(team), Some(opponent)) = (teams.get(player.team_id), teams.get(opponent_id)) else {
        return rejected(&mut counters, Rejection::MissingTeam);
    };

    let context_games = f
        .use_context
        .then(|| contextual_split(history, game, player.team_id));
    let recent: Vec<&HistoryEntry> = match &context_games {
        Some(ctx) => {
            let window: Vec<&HistoryEntry> =
                ctx.iter().take(f.context_time_window).copied().collect();
            if window.is_empty() || window.len() < f.context_time_window.min(3) {
                return rejected(&mut counters, Rejection::InsufficientContext);
            }
            window
        }
        None => history.iter().take(f.time_window).collect(),
    };
    if recent.is_empty() {
        return rejected(&mut counters, Rejection::InsufficientHistory);
    }

    let h2h_games = f
        .use_h2h
        .then(|| head_to_head_split(history, game, player.team_id));
    if h2h_games.as_ref().is_some_and(Vec::is_empty) {
        return rejected(&mut counters, Rejection::NoH2hGames);
    }

    if let Some(min_minutes) = f.min_minutes.active() {
        let window = if f.minutes_window == WINDOW_ALL_GAMES {
            history.len()
        } else {
            f.minutes_window
        };
        let avg_minutes = mean(history.iter().take(window).map(|e| e.stat.minutes));
        if avg_minutes < min_minutes {
            return rejected(&mut counters, Rejection::LowMinutes);
        }
    }

    let ai_prediction = prediction.map_or(0.0, |p| p.stat(stat));
    let confidence = prediction.map_or(0.0, |p| p.confidence);
    let non_finite = |field| EvaluationError::NonFinite {
        player_id: player.id,
        game_id: game.id,
        field,
    };
    if !ai_prediction.is_finite() {
        return Err(non_finite("ai_prediction"));
    }
    if !confidence.is_finite() {
        return Err(non_finite("confidence"));
    }
    if confidence <= 0.0 {
        return rejected(&mut counters, Rejection::SkippedNoPrediction);
    }
    if let Some(min_confidence) = f.min_confidence.active() {
        if confidence < min_confidence {
            return rejected(&mut counters, Rejection::LowConfidence);
        }
    }

    let season_average = mean(history.iter().map(|e| stat.actual(&e.stat)));
    if !season_average.is_finite() {
        return Err(non_finite("season_average"));
    }
    let line = calculate_line(
        season_average,
        ai_prediction,
        f.line_method,
        f.line_adjustment,
        direction,
        stat,
        Some(&f.custom_line_modifiers),
    );

    let recent_values = chronological_values(recent.iter().copied(), stat);
    let overall_hit_rate = calculate_hit_rate(&recent_values, line, direction);
    if !f
        .hit_rate
        .accepts(overall_hit_rate.hit_rate, overall_hit_rate.hit_count)
    {
        return rejected(&mut counters, Rejection::HitRate);
    }

    let mut context = None;
    if let Some(ctx) = &context_games {
        let values =
            chronological_values(ctx.iter().take(f.context_time_window).copied(), stat);
        let hit_rate = calculate_hit_rate(&values, line, direction);
        if f
            .context_hit_rate
            .active()
            .is_some_and(|min| hit_rate.hit_rate < min)
        {
            return rejected(&mut counters, Rejection::ContextHitRate);
        }
        let consecutive_hits = calculate_consecutive_hits(&values, line, direction);
        if f
            .context_consecutive
            .active()
            .is_some_and(|min| consecutive_hits < min)
        {
            return rejected(&mut counters, Rejection::ContextConsecutive);
        }
        context = Some(SplitStats {
            hit_rate,
            consecutive_hits,
        });
    }

    let mut h2h = None;
    if let Some(games) = &h2h_games {
        let values = chronological_values(games.iter().take(f.h2h_time_window).copied(), stat);
        let hit_rate = calculate_hit_rate(&values, line, direction);
        if f
            .h2h_hit_rate
            .active()
            .is_some_and(|min| hit_rate.hit_rate < min)
        {
            return rejected(&mut counters, Rejection::H2hHitRate);
        }
        let consecutive_hits = calculate_consecutive_hits(&values, line, direction);
        if f
            .h2h_consecutive
            .active()
            .is_some_and(|min| consecutive_hits < min)
        {
            return rejected(&mut counters, Rejection::H2hConsecutive);
        }
        h2h = Some(SplitStats {
            hit_rate,
            consecutive_hits,
        });
    }

    let consecutive_hits = calculate_consecutive_hits(&recent_values, line, direction);
    if f
        .consecutive
        .active()
        .is_some_and(|min| consecutive_hits < min)
    {
        return rejected(&mut counters, Rejection::Consecutive);
    }

    let ai_margin = match direction {
        Direction::Over => ai_prediction - line,
        Direction::Under => line - ai_prediction,
    };
    if !f.ai_agreement.accepts(ai_margin) {
        return rejected(&mut counters, Rejection::AiAgreement);
    }

    let strength = calculate_strength_score(&StrengthInput {
        hit_rate: overall_hit_rate.hit_rate,
        context_hit_rate: context.map(|c| c.hit_rate.hit_rate),
        ai_margin,
        confidence,
        defense_rank: opponent.defense_rank,
        pace_bonus: teams.pace_bonus(opponent_id, direction),
    });

    let is_home = game.is_home(player.team_id);
    let overall = SplitStats {
        hit_rate: overall_hit_rate,
        consecutive_hits,
    };
    let reasons = build_reasons(&ReasonInput {
        stat,
        direction,
        line,
        is_home,
        opponent_abbreviation: &opponent.team.abbreviation,
        overall,
        context,
        h2h,
        ai_prediction,
        ai_margin,
        confidence,
    });

    if let Some(c) = counters.as_deref_mut() {
        c.passed += 1;
    }

    Ok(Some(PickResult {
        player_id: player.id,
        player_name: player.full_name.clone(),
        position: player.position_bucket(),
        team_id: player.team_id,
        team_abbreviation: team.team.abbreviation.clone(),
        opponent_id,
        opponent_abbreviation: opponent.team.abbreviation.clone(),
        game_id: game.id,
        game_date: game.game_date,
        is_home,
        stat_type: stat,
        direction,
        line,
        season_average,
        ai_prediction,
        confidence,
        ai_margin,
        overall,
        context,
        h2h,
        opponent_defense_rank: opponent.defense_rank,
        strength_score: strength.score,
        strength_breakdown: strength.breakdown,
        reasons,
    }))
}

struct ReasonInput<'a> {
    stat: StatType,
    direction: Direction,
    line: f64,
    is_home: bool,
    opponent_abbreviation: &'a str,
    overall: SplitStats,
    context: Option<SplitStats>,
    h2h: Option<SplitStats>,
    ai_prediction: f64,
    ai_margin: f64,
    confidence: f64,
}

fn build_reasons(r: &ReasonInput<'_>) -> Vec<String> {
    let target = format!("{} {:.1} {}", r.direction, r.line, r.stat.label());
    let split = |s: &SplitStats, scope: &str| {
        format!(
            "Went {target} in {}/{} {scope} ({:.0}%)",
            s.hit_rate.hit_count, s.hit_rate.total_games, s.hit_rate.hit_rate
        )
    };

    let mut reasons = vec![split(&r.overall, "recent games")];
    if let Some(ctx) = &r.context {
        let venue = if r.is_home { "home games" } else { "road games" };
        reasons.push(split(ctx, venue));
    }
    if let Some(h2h) = &r.h2h {
        reasons.push(split(h2h, &format!("games vs {}", r.opponent_abbreviation)));
    }
    if r.overall.consecutive_hits > 0 {
        reasons.push(format!(
            "Hit in {} straight game{}",
            r.overall.consecutive_hits,
            if r.overall.consecutive_hits == 1 { "" } else { "s" }
        ));
    }
    if r.ai_margin > 0.0 {
        let side = match r.direction {
            Direction::Over => "above",
            Direction::Under => "below",
        };
        reasons.push(format!(
            "AI projects {:.1} {}, {:.1} {side} the line",
            r.ai_prediction,
            r.stat.label(),
            r.ai_margin
        ));
    }
    if r.confidence >= HIGH_CONFIDENCE {
        reasons.push(format!("High model confidence ({:.0}%)", r.confidence));
    }
    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{HistoryIndex, SlateContext};
    use common::filters::{AiAgreement, Gate, HitRateGate, HitRateMode, LineAdjustment};
    use common::types::{GameStatus, GameType, PlayerGameStat, Team, TeamRating};
    use std::collections::HashMap;

    const TEAM: i64 = 10;
    const OPP: i64 = 20;
    const OTHER: i64 = 30;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Days::new(u64::from(d))
    }

    fn player() -> Player {
        Player {
            id: 7,
            full_name: "Test Guard".to_string(),
            position: "PG".to_string(),
            team_id: TEAM,
            is_active: true,
        }
    }

    fn upcoming() -> Game {
        Game {
            id: 1000,
            game_date: day(60),
            home_team_id: TEAM,
            away_team_id: OPP,
            status: GameStatus::Scheduled,
            season: "2024-25".to_string(),
            game_type: GameType::RegularSeason,
        }
    }

    fn teams() -> TeamDirectory {
        let t = |id, abbr: &str| Team {
            id,
            full_name: abbr.to_string(),
            abbreviation: abbr.to_string(),
        };
        let r = |team_id, d, p| TeamRating {
            team_id,
            season: "2024-25".to_string(),
            defensive_rating: Some(d),
            pace: Some(p),
        };
        TeamDirectory::build(
            vec![t(TEAM, "HOM"), t(OPP, "OPP"), t(OTHER, "OTH")],
            &[r(TEAM, 112.0, 99.0), r(OPP, 108.0, 103.0), r(OTHER, 115.0, 98.0)],
        )
    }

    /// Points oldest first; games alternate home/away and opponents OPP/OTHER.
    fn history(points_oldest_first: &[f64]) -> Vec<HistoryEntry> {
        let mut games = HashMap::new();
        let mut rows = Vec::new();
        for (i, pts) in points_oldest_first.iter().enumerate() {
            let id = i as i64 + 1;
            let opp = if i % 2 == 0 { OPP } else { OTHER };
            let (home, away) = if i % 3 == 0 { (TEAM, opp) } else { (opp, TEAM) };
            games.insert(
                id,
                Game {
                    id,
                    game_date: day(i as u32 + 1),
                    home_team_id: home,
                    away_team_id: away,
                    status: GameStatus::Completed,
                    season: "2024-25".to_string(),
                    game_type: GameType::RegularSeason,
                },
            );
            rows.push(PlayerGameStat {
                player_id: 7,
                game_id: id,
                team_id: TEAM,
                points: *pts,
                rebounds: 5.0,
                assists: 3.0,
                steals: 1.0,
                blocks: 0.0,
                turnovers: 2.0,
                three_pointers_made: 2.0,
                minutes: 32.0,
            });
        }
        let slate = SlateContext {
            date: day(60),
            game_type: GameType::RegularSeason,
            separate_playoff_stats: false,
        };
        HistoryIndex::build(rows, &games, &slate)
            .get(7)
            .map(<[HistoryEntry]>::to_vec)
            .unwrap_or_default()
    }

    fn prediction(points: f64, confidence: f64) -> AveragedPrediction {
        AveragedPrediction {
            points,
            confidence,
            model_count: 1,
            ..AveragedPrediction::default()
        }
    }

    const SCENARIO: [f64; 10] = [20.0, 22.0, 18.0, 25.0, 19.0, 21.0, 23.0, 17.0, 24.0, 20.0];

    fn run(
        filters: &PickFinderFilters,
        hist: &[HistoryEntry],
        pred: Option<&AveragedPrediction>,
        direction: Direction,
        counters: &mut RejectionCounters,
    ) -> Option<PickResult> {
        let p = player();
        let g = upcoming();
        let t = teams();
        let input = EvaluationInput {
            player: &p,
            game: &g,
            teams: &t,
            filters,
            history: hist,
            prediction: pred,
            stat: StatType::Points,
            direction,
        };
        evaluate_player_pick(&input, Some(counters)).unwrap()
    }

    #[test]
    fn test_permissive_filters_always_produce_a_pick() {
        let hist = history(&[5.0, 6.0, 7.0]);
        let pred = prediction(3.0, 1.0);
        let mut c = RejectionCounters::default();
        for dir in [Direction::Over, Direction::Under] {
            let pick = run(&PickFinderFilters::permissive(), &hist, Some(&pred), dir, &mut c);
            assert!(pick.is_some(), "direction {dir}");
        }
        assert_eq!(c.passed, 2);
        assert_eq!(c.total_rejected(), 0);
    }

    #[test]
    fn test_scenario_line_hit_rate_and_streak() {
        let hist = history(&SCENARIO);
        let pred = prediction(23.0, 80.0);
        let mut c = RejectionCounters::default();
        let pick = run(
            &PickFinderFilters::permissive(),
            &hist,
            Some(&pred),
            Direction::Over,
            &mut c,
        )
        .unwrap();
        assert!((pick.season_average - 20.9).abs() < 1e-9);
        assert!((pick.line - 21.0).abs() < 1e-9);
        assert_eq!(pick.overall.hit_rate.hit_count, 4);
        assert!((pick.overall.hit_rate.hit_rate - 40.0).abs() < 1e-9);
        assert_eq!(pick.overall.consecutive_hits, 0);
        assert!((pick.ai_margin - 2.0).abs() < 1e-9);
        assert!(pick.reasons[0].contains("4/10"));
        assert_eq!(pick.position, PositionBucket::G);
        assert!(pick.is_home);
        assert_eq!(pick.opponent_abbreviation, "OPP");
        // OPP has the best defensive rating of the three.
        assert_eq!(pick.opponent_defense_rank, Some(1));
    }

    #[test]
    fn test_hit_rate_gate_rejects_and_counts() {
        let hist = history(&SCENARIO);
        let pred = prediction(23.0, 80.0);
        let filters = PickFinderFilters {
            hit_rate: HitRateGate {
                enabled: true,
                threshold: 50.0,
                mode: HitRateMode::Percentage,
            },
            ..PickFinderFilters::permissive()
        };
        let mut c = RejectionCounters::default();
        assert!(run(&filters, &hist, Some(&pred), Direction::Over, &mut c).is_none());
        assert_eq!(c.hit_rate, 1);
        // Under: values < 21 are 20,18,19,17,20 = 5/10.
        assert!(run(&filters, &hist, Some(&pred), Direction::Under, &mut c).is_some());
    }

    #[test]
    fn test_hit_rate_count_mode() {
        let hist = history(&SCENARIO);
        let pred = prediction(23.0, 80.0);
        let filters = PickFinderFilters {
            hit_rate: HitRateGate {
                enabled: true,
                threshold: 4.0,
                mode: HitRateMode::Count,
            },
            ..PickFinderFilters::permissive()
        };
        let mut c = RejectionCounters::default();
        assert!(run(&filters, &hist, Some(&pred), Direction::Over, &mut c).is_some());
    }

    #[test]
    fn test_short_history_rejected() {
        let hist = history(&[20.0, 21.0]);
        let pred = prediction(23.0, 80.0);
        let mut c = RejectionCounters::default();
        assert!(run(
            &PickFinderFilters::permissive(),
            &hist,
            Some(&pred),
            Direction::Over,
            &mut c
        )
        .is_none());
        assert_eq!(c.insufficient_history, 1);

        // A window smaller than three lowers the floor.
        let filters = PickFinderFilters {
            time_window: 2,
            ..PickFinderFilters::permissive()
        };
        assert!(run(&filters, &hist, Some(&pred), Direction::Over, &mut c).is_some());
    }

    #[test]
    fn test_empty_window_never_scores() {
        let pred = prediction(23.0, 80.0);
        let mut c = RejectionCounters::default();
        let zero_window = PickFinderFilters {
            time_window: 0,
            ..PickFinderFilters::permissive()
        };
        assert!(run(&zero_window, &[], Some(&pred), Direction::Over, &mut c).is_none());
        assert!(run(
            &zero_window,
            &history(&SCENARIO),
            Some(&pred),
            Direction::Over,
            &mut c
        )
        .is_none());
        assert_eq!(c.insufficient_history, 2);

        let zero_context = PickFinderFilters {
            use_context: true,
            context_time_window: 0,
            ..PickFinderFilters::permissive()
        };
        let hist = history(&SCENARIO);
        assert!(run(&zero_context, &hist, Some(&pred), Direction::Over, &mut c).is_none());
        assert_eq!(c.insufficient_context, 1);
        assert_eq!(c.passed, 0);
    }

    #[test]
    fn test_missing_opponent_team_rejected() {
        let hist = history(&SCENARIO);
        let pred = prediction(23.0, 80.0);
        let p = player();
        let mut g = upcoming();
        g.away_team_id = 99;
        let t = teams();
        let f = PickFinderFilters::permissive();
        let mut c = RejectionCounters::default();
        let input = EvaluationInput {
            player: &p,
            game: &g,
            teams: &t,
            filters: &f,
            history: &hist,
            prediction: Some(&pred),
            stat: StatType::Points,
            direction: Direction::Over,
        };
        assert_eq!(evaluate_player_pick(&input, Some(&mut c)), Ok(None));
        assert_eq!(c.missing_team, 1);
    }

    #[test]
    fn test_context_split_requires_enough_games() {
        // Ten games, home when i % 3 == 0: four home games.
        let hist = history(&SCENARIO);
        let pred = prediction(23.0, 80.0);
        let mut c = RejectionCounters::default();

        let filters = PickFinderFilters {
            use_context: true,
            context_time_window: 10,
            ..PickFinderFilters::permissive()
        };
        let pick = run(&filters, &hist, Some(&pred), Direction::Over, &mut c).unwrap();
        let ctx = pick.context.unwrap();
        assert_eq!(ctx.hit_rate.total_games, 4);
        // Home games oldest first: 20, 25, 23, 20 against line 21.
        assert_eq!(ctx.hit_rate.hit_count, 2);
        assert_eq!(pick.overall.hit_rate.total_games, 4);
        assert!(pick.reasons.iter().any(|r| r.contains("home games")));

        let short = history(&SCENARIO[..6]);
        // Home games in six: i = 0, 3 -> two, fewer than three.
        assert!(run(&filters, &short, Some(&pred), Direction::Over, &mut c).is_none());
        assert_eq!(c.insufficient_context, 1);
    }

    #[test]
    fn test_context_gates() {
        let hist = history(&SCENARIO);
        let pred = prediction(23.0, 80.0);
        let mut c = RejectionCounters::default();
        let filters = PickFinderFilters {
            use_context: true,
            context_hit_rate: Gate::on(60.0),
            ..PickFinderFilters::permissive()
        };
        assert!(run(&filters, &hist, Some(&pred), Direction::Over, &mut c).is_none());
        assert_eq!(c.context_hit_rate, 1);

        let filters = PickFinderFilters {
            use_context: true,
            context_consecutive: Gate::on(1),
            ..PickFinderFilters::permissive()
        };
        // Most recent home game is 20, a miss.
        assert!(run(&filters, &hist, Some(&pred), Direction::Over, &mut c).is_none());
        assert_eq!(c.context_consecutive, 1);
    }

    #[test]
    fn test_h2h_requires_a_meeting_and_gates() {
        let pred = prediction(23.0, 80.0);
        let mut c = RejectionCounters::default();
        let filters = PickFinderFilters {
            use_h2h: true,
            ..PickFinderFilters::permissive()
        };

        // Three games, only indices 0 and 2 are vs OPP.
        let hist = history(&[30.0, 10.0, 12.0]);
        let pick = run(&filters, &hist, Some(&pred), Direction::Over, &mut c).unwrap();
        let h2h = pick.h2h.unwrap();
        assert_eq!(h2h.hit_rate.total_games, 2);
        assert!(pick.reasons.iter().any(|r| r.contains("vs OPP")));

        let gated = PickFinderFilters {
            h2h_hit_rate: Gate::on(75.0),
            ..filters.clone()
        };
        assert!(run(&gated, &hist, Some(&pred), Direction::Over, &mut c).is_none());
        assert_eq!(c.h2h_hit_rate, 1);

        let gated = PickFinderFilters {
            h2h_consecutive: Gate::on(1),
            ..filters.clone()
        };
        assert!(run(&gated, &hist, Some(&pred), Direction::Over, &mut c).is_none());
        assert_eq!(c.h2h_consecutive, 1);

        // History with no OPP meeting: the odd indices only.
        let mut no_meeting = history(&[30.0, 10.0, 12.0, 14.0]);
        no_meeting.retain(|e| e.opponent_id() != OPP);
        let loose = PickFinderFilters {
            time_window: 2,
            ..filters
        };
        assert!(run(&loose, &no_meeting, Some(&pred), Direction::Over, &mut c).is_none());
        assert_eq!(c.no_h2h_games, 1);
    }

    #[test]
    fn test_minutes_gate_window_and_sentinel() {
        let mut hist = history(&SCENARIO);
        // Most recent two games short minutes.
        hist[0].stat.minutes = 5.0;
        hist[1].stat.minutes = 5.0;
        let pred = prediction(23.0, 80.0);
        let mut c = RejectionCounters::default();

        let recent = PickFinderFilters {
            min_minutes: Gate::on(20.0),
            minutes_window: 2,
            ..PickFinderFilters::permissive()
        };
        assert!(run(&recent, &hist, Some(&pred), Direction::Over, &mut c).is_none());
        assert_eq!(c.low_minutes, 1);

        // Whole history: (2*5 + 8*32) / 10 = 26.6
        let all = PickFinderFilters {
            minutes_window: WINDOW_ALL_GAMES,
            ..recent
        };
        assert!(run(&all, &hist, Some(&pred), Direction::Over, &mut c).is_some());
    }

    #[test]
    fn test_confidence_gates() {
        let hist = history(&SCENARIO);
        let mut c = RejectionCounters::default();
        let filters = PickFinderFilters {
            min_confidence: Gate::on(75.0),
            ..PickFinderFilters::permissive()
        };
        let low = prediction(23.0, 70.0);
        assert!(run(&filters, &hist, Some(&low), Direction::Over, &mut c).is_none());
        assert_eq!(c.low_confidence, 1);

        let zero = prediction(23.0, 0.0);
        assert!(run(
            &PickFinderFilters::permissive(),
            &hist,
            Some(&zero),
            Direction::Over,
            &mut c
        )
        .is_none());
        let permissive = PickFinderFilters::permissive();
        assert!(run(&permissive, &hist, None, Direction::Over, &mut c).is_none());
        assert_eq!(c.skipped_no_prediction, 2);
    }

    #[test]
    fn test_consecutive_gate() {
        // Newest three all above 21.
        let hist = history(&[10.0, 12.0, 30.0, 28.0, 26.0]);
        let pred = prediction(23.0, 80.0);
        let mut c = RejectionCounters::default();
        let filters = PickFinderFilters {
            consecutive: Gate::on(3),
            ..PickFinderFilters::permissive()
        };
        let pick = run(&filters, &hist, Some(&pred), Direction::Over, &mut c).unwrap();
        assert_eq!(pick.overall.consecutive_hits, 3);
        assert!(pick.reasons.iter().any(|r| r.contains("3 straight games")));

        let strict = PickFinderFilters {
            consecutive: Gate::on(4),
            ..filters
        };
        assert!(run(&strict, &hist, Some(&pred), Direction::Over, &mut c).is_none());
        assert_eq!(c.consecutive, 1);
    }

    #[test]
    fn test_ai_agreement_levels() {
        let hist = history(&SCENARIO); // line 21.0
        let mut c = RejectionCounters::default();
        let with = |level| PickFinderFilters {
            ai_agreement: level,
            ..PickFinderFilters::permissive()
        };

        let mut picks = |level, pred: &AveragedPrediction, dir| {
            run(&with(level), &hist, Some(pred), dir, &mut c).is_some()
        };

        let below = prediction(20.0, 80.0);
        assert!(picks(AiAgreement::Disabled, &below, Direction::Over));
        assert!(!picks(AiAgreement::Simple, &below, Direction::Over));
        // Under agrees with a low projection.
        assert!(picks(AiAgreement::Simple, &below, Direction::Under));

        let plus_two = prediction(23.0, 80.0);
        assert!(picks(AiAgreement::Strong, &plus_two, Direction::Over));
        assert!(!picks(AiAgreement::VeryStrong, &plus_two, Direction::Over));
        assert_eq!(c.ai_agreement, 2);
    }

    #[test]
    fn test_favorable_line_feeds_pick() {
        let hist = history(&SCENARIO);
        let pred = prediction(23.0, 80.0);
        let filters = PickFinderFilters {
            line_adjustment: LineAdjustment::Favorable,
            ..PickFinderFilters::permissive()
        };
        let mut c = RejectionCounters::default();
        let pick = run(&filters, &hist, Some(&pred), Direction::Over, &mut c).unwrap();
        assert!((pick.line - 18.5).abs() < 1e-9);
        // > 18.5: everything but 18 and 17.
        assert_eq!(pick.overall.hit_rate.hit_count, 8);
    }

    #[test]
    fn test_non_finite_prediction_is_an_error() {
        let hist = history(&SCENARIO);
        let pred = prediction(f64::NAN, 80.0);
        let p = player();
        let g = upcoming();
        let t = teams();
        let f = PickFinderFilters::permissive();
        let input = EvaluationInput {
            player: &p,
            game: &g,
            teams: &t,
            filters: &f,
            history: &hist,
            prediction: Some(&pred),
            stat: StatType::Points,
            direction: Direction::Over,
        };
        assert!(matches!(
            evaluate_player_pick(&input, None),
            Err(EvaluationError::NonFinite { field: "ai_prediction", .. })
        ));
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let hist = history(&SCENARIO);
        let pred = prediction(23.0, 80.0);
        let mut c = RejectionCounters::default();
        let f = PickFinderFilters {
            use_context: true,
            use_h2h: true,
            ..PickFinderFilters::permissive()
        };
        let a = run(&f, &hist, Some(&pred), Direction::Over, &mut c);
        let b = run(&f, &hist, Some(&pred), Direction::Over, &mut c);
        assert!(a.is_some());
        assert_eq!(a, b);
    }
}

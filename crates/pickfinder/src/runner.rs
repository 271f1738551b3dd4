use common::config::Store;
use common::filters::{Direction, PickFinderFilters};
use common::types::{Game, Player, PlayerGameStat, StatType};
use std::collections::{BTreeSet, HashMap};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::diagnostics::{Rejection, RejectionCounters};
use crate::error::FindError;
use crate::evaluator::{evaluate_player_pick, EvaluationInput, PickResult};
use crate::history::{HistoryIndex, SlateContext};
use crate::predictions::average_predictions;
use crate::progress::{Progress, Stage};
use crate::source::PickDataSource;
use crate::teams::TeamDirectory;

/// One stat type and one direction over the next slate.
pub struct PassRequest<'a> {
    pub filters: &'a PickFinderFilters,
    pub stat: StatType,
    pub direction: Direction,
    pub model_versions: &'a [String],
}

#[derive(Debug, Default)]
pub struct DirectionOutcome {
    /// Strongest first.
    pub picks: Vec<PickResult>,
    pub diagnostics: RejectionCounters,
}

fn ensure_active(cancel: &CancellationToken) -> Result<(), FindError> {
    if cancel.is_cancelled() {
        Err(FindError::Cancelled)
    } else {
        Ok(())
    }
}

/// Games of the earliest date among `upcoming`; later dates are dropped.
pub fn target_slate(upcoming: Vec<Game>) -> Vec<Game> {
    let Some(date) = upcoming.iter().map(|g| g.game_date).min() else {
        return Vec::new();
    };
    let mut slate: Vec<Game> = upcoming
        .into_iter()
        .filter(|g| g.game_date == date)
        .collect();
    slate.sort_by_key(|g| g.id);
    slate
}

/// Strength descending; ties keep a stable player/game order.
pub fn sort_picks(picks: &mut [PickResult]) {
    picks.sort_by(|a, b| {
        b.strength_score
            .cmp(&a.strength_score)
            .then(a.player_id.cmp(&b.player_id))
            .then(a.game_id.cmp(&b.game_id))
            .then(a.stat_type.cmp(&b.stat_type))
            .then(a.direction.as_str().cmp(b.direction.as_str()))
    });
}

/// Run one pass over the next slate. Store failures abort the pass, except team ratings,
/// which only enrich scoring.
pub async fn find_picks_for_direction<S>(
    source: &S,
    store: &Store,
    req: &PassRequest<'_>,
    on_progress: &mut (dyn FnMut(Progress) + Send),
    cancel: &CancellationToken,
) -> Result<DirectionOutcome, FindError>
where
    S: PickDataSource + Sync,
{
    let span = tracing::info_span!(
        "direction_pass",
        stat = req.stat.as_str(),
        direction = req.direction.as_str()
    );
    run_pass(source, store, req, on_progress, cancel)
        .instrument(span)
        .await
}

#[allow(clippy::too_many_lines)] // fetch stages then evaluation loop
async fn run_pass<S>(
    source: &S,
    store: &Store,
    req: &PassRequest<'_>,
    on_progress: &mut (dyn FnMut(Progress) + Send),
    cancel: &CancellationToken,
) -> Result<DirectionOutcome, FindError>
where
    S: PickDataSource + Sync,
{
    let mut diagnostics = RejectionCounters::default();

    on_progress(Progress::at(Stage::Games));
    ensure_active(cancel)?;
    let slate = target_slate(source.fetch_upcoming_games(store.upcoming_games_limit).await?);
    let Some(first) = slate.first() else {
        tracing::info!("no upcoming games");
        return Ok(DirectionOutcome::default());
    };
    let slate_ctx = SlateContext {
        date: first.game_date,
        game_type: first.game_type,
        separate_playoff_stats: req.filters.separate_playoff_stats,
    };
    let season = first.season.clone();
    let team_ids: Vec<i64> = slate
        .iter()
        .flat_map(|g| [g.home_team_id, g.away_team_id])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    on_progress(Progress::at(Stage::Players));
    ensure_active(cancel)?;
    let players = source.fetch_active_players(&team_ids).await?;
    if players.is_empty() {
        tracing::info!(date = %slate_ctx.date, "no active players on slate");
        return Ok(DirectionOutcome::default());
    }
    ensure_active(cancel)?;
    let teams = source.fetch_teams(&team_ids).await?;
    ensure_active(cancel)?;
    let ratings = match source.fetch_team_ratings(&season).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(
                season = %season,
                error = %e,
                "team ratings unavailable; scoring without defense and pace"
            );
            Vec::new()
        }
    };
    let directory = TeamDirectory::build(teams, &ratings);

    on_progress(Progress::at(Stage::Predictions));
    let game_ids: Vec<i64> = slate.iter().map(|g| g.id).collect();
    let mut prediction_rows = Vec::new();
    for chunk in game_ids.chunks(store.game_batch_size.max(1)) {
        ensure_active(cancel)?;
        prediction_rows.extend(source.fetch_predictions(chunk, req.model_versions).await?);
    }
    let predictions = average_predictions(&prediction_rows, req.model_versions);

    on_progress(Progress::at(Stage::History));
    let mut predicted: Vec<i64> = predictions.keys().copied().collect();
    predicted.sort_unstable();
    let stat_rows = fetch_history_rows(source, store, &predicted, cancel).await?;
    let history_game_ids: Vec<i64> = stat_rows
        .iter()
        .map(|s| s.game_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let mut history_games = HashMap::with_capacity(history_game_ids.len());
    for chunk in history_game_ids.chunks(store.game_batch_size.max(1)) {
        ensure_active(cancel)?;
        for g in source.fetch_games(chunk).await? {
            history_games.insert(g.id, g);
        }
    }
    let history = HistoryIndex::build(stat_rows, &history_games, &slate_ctx);
    tracing::debug!(
        players = history.player_count(),
        games = history_games.len(),
        "history indexed"
    );

    on_progress(Progress::at(Stage::Filtering));
    ensure_active(cancel)?;
    let mut roster: Vec<&Player> = players.iter().collect();
    roster.sort_by_key(|p| p.id);
    let mut picks = Vec::new();
    for game in &slate {
        for player in roster.iter().copied().filter(|p| {
            p.team_id == game.home_team_id || p.team_id == game.away_team_id
        }) {
            let Some(prediction) = predictions.get(&player.id).filter(|p| p.confidence > 0.0)
            else {
                diagnostics.record(Rejection::SkippedNoPrediction);
                continue;
            };
            let Some(player_history) = history.get(player.id) else {
                diagnostics.record(Rejection::SkippedNoHistory);
                continue;
            };
            let input = EvaluationInput {
                player,
                game,
                teams: &directory,
                filters: req.filters,
                history: player_history,
                prediction: Some(prediction),
                stat: req.stat,
                direction: req.direction,
            };
            match evaluate_player_pick(&input, Some(&mut diagnostics)) {
                Ok(Some(pick)) => picks.push(pick),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        player_id = player.id,
                        game_id = game.id,
                        error = %e,
                        "player evaluation failed"
                    );
                    diagnostics.record(Rejection::EvaluationError);
                }
            }
        }
    }

    on_progress(Progress::at(Stage::Scoring));
    sort_picks(&mut picks);
    on_progress(Progress {
        stage: Stage::Scoring,
        percent: 100,
    });

    tracing::info!(
        date = %slate_ctx.date,
        games = slate.len(),
        players = players.len(),
        evaluated = diagnostics.evaluated,
        picks = picks.len(),
        "direction pass complete"
    );
    Ok(DirectionOutcome { picks, diagnostics })
}

/// Box scores for `player_ids`, batched by player and paged within each batch.
async fn fetch_history_rows<S>(
    source: &S,
    store: &Store,
    player_ids: &[i64],
    cancel: &CancellationToken,
) -> Result<Vec<PlayerGameStat>, FindError>
where
    S: PickDataSource + Sync,
{
    let page_size = store.stats_page_size.max(1);
    let mut rows = Vec::new();
    for batch in player_ids.chunks(store.player_batch_size.max(1)) {
        let mut offset = 0_u32;
        loop {
            ensure_active(cancel)?;
            let page = source
                .fetch_player_stats_page(batch, page_size, offset)
                .await?;
            let n = page.len();
            rows.extend(page);
            if n < page_size as usize {
                break;
            }
            offset += page_size;
        }
    }
    Ok(rows)
}

use common::config::Store;
use common::filters::PickFinderFilters;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::diagnostics::RejectionCounters;
use crate::error::FindError;
use crate::evaluator::PickResult;
use crate::progress::{PassSlice, Progress, Stage};
use crate::runner::{find_picks_for_direction, sort_picks, PassRequest};
use crate::source::PickDataSource;

/// Entry point for a pick search. Holds the state a caller renders while a search runs:
/// whether one is in flight, the last failure, and the rejection counters of the last search.
pub struct PickFinder<S> {
    source: S,
    store: Store,
    completion_delay: Duration,
    loading: AtomicBool,
    error: Mutex<Option<String>>,
    diagnostics: Mutex<RejectionCounters>,
}

/// Clears the loading flag even when the search future is dropped mid-flight.
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<S> PickFinder<S>
where
    S: PickDataSource + Sync,
{
    pub fn new(source: S, store: Store, completion_delay: Duration) -> Self {
        Self {
            source,
            store,
            completion_delay,
            loading: AtomicBool::new(false),
            error: Mutex::new(None),
            diagnostics: Mutex::new(RejectionCounters::default()),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn error(&self) -> Option<String> {
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rejection counters merged over every pass of the last search.
    pub fn diagnostics(&self) -> RejectionCounters {
        *self
            .diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run every stat/direction pass the filters ask for, one after another, and return
    /// the merged picks strongest first. Any failure fails the whole search.
    pub async fn find_picks(
        &self,
        filters: &PickFinderFilters,
        model_versions: &[String],
        on_progress: Option<&mut (dyn FnMut(Progress) + Send)>,
        cancel: &CancellationToken,
    ) -> Result<Vec<PickResult>, FindError> {
        self.loading.store(true, Ordering::SeqCst);
        let _loading = LoadingGuard(&self.loading);
        *self.error.lock().unwrap_or_else(PoisonError::into_inner) = None;
        *self
            .diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = RejectionCounters::default();

        let start = Instant::now();
        let mut diagnostics = RejectionCounters::default();
        let res = self
            .run_passes(filters, model_versions, on_progress, cancel, &mut diagnostics)
            .await;
        let ms = start.elapsed().as_secs_f64() * 1000.0;

        *self
            .diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = diagnostics;
        for (rejection, n) in diagnostics.nonzero() {
            metrics::counter!("pickfinder_rejections_total", "gate" => rejection.as_str())
                .increment(u64::from(n));
        }

        match &res {
            Ok(picks) => {
                metrics::histogram!("pickfinder_search_latency_ms", "status" => "ok").record(ms);
                metrics::counter!("pickfinder_picks_total").increment(picks.len() as u64);
                tracing::info!(
                    picks = picks.len(),
                    evaluated = diagnostics.evaluated,
                    passed = diagnostics.passed,
                    rejected = diagnostics.total_rejected(),
                    diagnostics = ?diagnostics,
                    "pick search complete"
                );
            }
            Err(e) => {
                metrics::histogram!("pickfinder_search_latency_ms", "status" => "err").record(ms);
                if matches!(e, FindError::Cancelled) {
                    tracing::warn!("pick search cancelled");
                } else {
                    tracing::error!(error = %e, kind = e.kind(), "pick search failed");
                }
                *self.error.lock().unwrap_or_else(PoisonError::into_inner) = Some(e.to_string());
            }
        }
        res
    }

    async fn run_passes(
        &self,
        filters: &PickFinderFilters,
        model_versions: &[String],
        mut on_progress: Option<&mut (dyn FnMut(Progress) + Send)>,
        cancel: &CancellationToken,
        diagnostics: &mut RejectionCounters,
    ) -> Result<Vec<PickResult>, FindError> {
        let passes: Vec<_> = filters
            .stat_type
            .stat_types()
            .into_iter()
            .flat_map(|stat| {
                filters
                    .over_under
                    .directions()
                    .into_iter()
                    .map(move |direction| (stat, direction))
            })
            .collect();

        let mut picks = Vec::new();
        for (i, (stat, direction)) in passes.iter().copied().enumerate() {
            if cancel.is_cancelled() {
                return Err(FindError::Cancelled);
            }
            let slice = PassSlice::new(i, passes.len());
            let mut report = |p: Progress| {
                if let Some(cb) = on_progress.as_deref_mut() {
                    cb(slice.map(p));
                }
            };
            let pass_filters = filters.for_pass(stat, direction);
            let req = PassRequest {
                filters: &pass_filters,
                stat,
                direction,
                model_versions,
            };
            let outcome =
                find_picks_for_direction(&self.source, &self.store, &req, &mut report, cancel)
                    .await?;
            metrics::counter!(
                "pickfinder_passes_total",
                "stat" => stat.as_str(),
                "direction" => direction.as_str()
            )
            .increment(1);
            diagnostics.merge(&outcome.diagnostics);
            picks.extend(outcome.picks);
        }

        sort_picks(&mut picks);
        if let Some(cb) = on_progress.as_deref_mut() {
            cb(Progress {
                stage: Stage::Scoring,
                percent: 100,
            });
        }
        if !self.completion_delay.is_zero() {
            tokio::select! {
                () = cancel.cancelled() => return Err(FindError::Cancelled),
                () = tokio::time::sleep(self.completion_delay) => {}
            }
        }
        Ok(picks)
    }
}

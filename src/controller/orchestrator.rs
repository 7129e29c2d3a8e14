use std::time::Duration;

use anyhow::anyhow;
use futures::{stream::FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    error::SearchError,
    metrics,
    protocol::{WorkerRequest, WorkerResult},
    types::interval::{SeedInterval, UnitId},
    worker::Launcher,
};

use super::{
    report::SearchReport,
    state::{FailureStatus, RecordStatus, SearchState},
};

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum number of units in flight at once
    pub workers: usize,
    /// Deadline for a single dispatched unit
    pub unit_timeout: Duration,
    /// How many times a failed unit is handed to a fresh worker
    pub max_retries: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|x| x.get())
                .unwrap_or(1),
            unit_timeout: Duration::from_secs(3600),
            max_retries: 2,
        }
    }
}

pub struct Orchestrator<L: Launcher> {
    launcher: L,
    config: OrchestratorConfig,
}

impl<L: Launcher> Orchestrator<L> {
    pub fn new(launcher: L, config: OrchestratorConfig) -> Result<Self, SearchError> {
        if config.workers == 0 {
            return Err(SearchError::invalid_config("number of workers must be positive"));
        }
        if config.unit_timeout.is_zero() {
            return Err(SearchError::invalid_config("unit timeout must be positive"));
        }
        Ok(Self { launcher, config })
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Dispatches every interval as its own unit and reduces the partial minima.
    /// At most `workers` units run at once; the next one starts when a slot frees.
    #[instrument(skip_all, fields(units = intervals.len()))]
    pub async fn run(
        &self,
        intervals: Vec<SeedInterval>,
        cancellation_token: CancellationToken,
    ) -> Result<SearchReport, SearchError> {
        let mut state = SearchState::new(intervals, self.config.max_retries);
        if state.is_empty() {
            return Err(SearchError::invalid_config("no intervals to search"));
        }
        info!(
            "Searching {} units with {} workers",
            state.len(),
            self.config.workers
        );
        let mut running = FuturesUnordered::new();

        loop {
            // Once a unit is given up on, the search can't complete: only drain what's running
            while running.len() < self.config.workers && !state.has_failures() {
                let Some((id, interval)) = state.take_next_dispatch() else {
                    break;
                };
                debug!("Dispatching unit {id} ({interval})");
                metrics::UNITS_DISPATCHED.inc();
                running.push(self.dispatch(id, interval));
            }

            if running.is_empty() {
                return match state.report() {
                    Some(report) => Ok(report),
                    None => Err(SearchError::StalledCompletion(state.failed())),
                };
            }

            let in_flight = running.len();
            let (id, outcome) = tokio::select! {
                Some(outcome) = running.next() => outcome,
                _ = cancellation_token.cancelled() => {
                    warn!("Search cancelled with {in_flight} units in flight");
                    return Err(SearchError::Cancelled);
                }
            };

            match outcome {
                Ok(result) => self.handle_result(&mut state, id, result),
                Err(err) => {
                    warn!("Unit {id} failed: {err:?}");
                    self.handle_failure(&mut state, id);
                }
            }

            if let Some(report) = state.report() {
                return Ok(report);
            }
            state.report_pending();
        }
    }

    async fn dispatch(
        &self,
        id: UnitId,
        interval: SeedInterval,
    ) -> (UnitId, anyhow::Result<WorkerResult>) {
        let request = WorkerRequest::new(id, &interval);
        let timeout = self.config.unit_timeout;
        let outcome = match tokio::time::timeout(timeout, self.launcher.launch(request)).await {
            Ok(result) => result,
            Err(_) => Err(anyhow!("No result within {timeout:?}")),
        };
        (id, outcome)
    }

    fn handle_result(&self, state: &mut SearchState, id: UnitId, result: WorkerResult) {
        info!(
            "Answer arrived for unit {} ({}): {}",
            result.unit_id, result.interval, result.min
        );
        let status = if result.unit_id == id {
            state.record_result(&result)
        } else {
            RecordStatus::Unknown
        };
        match status {
            RecordStatus::Recorded => {
                metrics::UNITS_COMPLETED.inc();
                if let Some(unit) = state.get(id) {
                    metrics::VALUES_SCANNED.inc_by(unit.interval.count().unsigned_abs());
                }
            }
            RecordStatus::Duplicate => {
                debug!("Ignoring duplicate result for unit {id}");
            }
            RecordStatus::Unknown => {
                let err = SearchError::StaleOrUnknownResult {
                    unit: result.unit_id,
                    interval: result.interval,
                };
                warn!("Discarding result: {err}");
                metrics::STALE_RESULTS.inc();
                // The dispatched unit is still unanswered
                self.handle_failure(state, id);
            }
        }
    }

    fn handle_failure(&self, state: &mut SearchState, id: UnitId) {
        match state.record_failure(id) {
            FailureStatus::Resubmitted { attempts } => {
                metrics::UNITS_RESUBMITTED.inc();
                warn!("Resubmitting unit {id} after {attempts} attempt(s)");
            }
            FailureStatus::Exhausted { attempts } => {
                error!("Giving up on unit {id} after {attempts} attempt(s)");
            }
            FailureStatus::Ignored => {}
        }
    }
}

pub mod orchestrator;
pub mod report;
pub mod state;

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    almanac::Almanac,
    cli::{Backend, SearchArgs, Strategy},
    error::SearchError,
    mapping::{MappingPipeline, Value},
    types::interval::{chunk_size_for, split_all, SeedInterval},
    worker::{compute_min_cancellable, Launcher, LocalLauncher, ProcessLauncher},
};

pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use report::SearchReport;

/// Loads the input and runs the selected strategy, returning the global minimum.
#[instrument(skip_all, fields(strategy = ?args.strategy))]
pub async fn run_search(
    args: SearchArgs,
    cancellation_token: CancellationToken,
) -> Result<Value, SearchError> {
    if args.chunk_size.is_some() && args.strategy != Strategy::Balanced {
        return Err(SearchError::invalid_config(format!(
            "--chunk-size only applies to the balanced strategy, not {:?}",
            args.strategy
        )));
    }
    let almanac = Almanac::load(&args.input).await?;
    let config = OrchestratorConfig {
        workers: args.workers.unwrap_or(1),
        unit_timeout: args.unit_timeout_sec,
        max_retries: args.max_retries,
    };
    match args.strategy {
        Strategy::Points => search_points(&almanac.seeds, &almanac.pipeline),
        Strategy::Sequential => {
            let intervals = almanac.seed_intervals()?;
            search_sequential(Arc::new(almanac.pipeline), intervals, cancellation_token).await
        }
        Strategy::PerInterval | Strategy::Balanced => {
            let intervals = almanac.seed_intervals()?;
            let units = plan_units(&intervals, args.strategy, config.workers, args.chunk_size)?;
            let report = match args.backend {
                Backend::Process => {
                    let launcher = ProcessLauncher::with_current_exe(&args.input)?;
                    distribute(launcher, config, units, cancellation_token).await?
                }
                Backend::Thread => {
                    let launcher = LocalLauncher::new(Arc::new(almanac.pipeline));
                    distribute(launcher, config, units, cancellation_token).await?
                }
            };
            Ok(report.global_min)
        }
    }
}

/// Units for the distributed strategies. Configuration errors surface here,
/// before anything is dispatched.
pub fn plan_units(
    intervals: &[SeedInterval],
    strategy: Strategy,
    workers: usize,
    chunk_size: Option<Value>,
) -> Result<Vec<SeedInterval>, SearchError> {
    if intervals.is_empty() {
        return Err(SearchError::invalid_config("no seed intervals to search"));
    }
    match strategy {
        Strategy::Balanced => {
            let max_chunk = match chunk_size {
                Some(size) => size,
                None => chunk_size_for(intervals, workers)?,
            };
            let units = split_all(intervals, max_chunk)?;
            info!(
                "Split {} intervals into {} units of at most {max_chunk} values",
                intervals.len(),
                units.len()
            );
            Ok(units)
        }
        _ => Ok(intervals.to_vec()),
    }
}

pub async fn distribute<L: Launcher>(
    launcher: L,
    config: OrchestratorConfig,
    units: Vec<SeedInterval>,
    cancellation_token: CancellationToken,
) -> Result<SearchReport, SearchError> {
    let orchestrator = Orchestrator::new(launcher, config)?;
    let report = orchestrator.run(units, cancellation_token).await?;
    report.log();
    debug!("Results:\n{report}");
    Ok(report)
}

pub fn search_points(seeds: &[Value], pipeline: &MappingPipeline) -> Result<Value, SearchError> {
    for &seed in seeds {
        debug!("Seed {seed}: {:?}", pipeline.trace(seed));
    }
    let min = seeds
        .iter()
        .map(|&seed| pipeline.apply(seed))
        .min()
        .ok_or_else(|| SearchError::invalid_config("no seeds to search"))?;
    info!("The answer is {min}");
    Ok(min)
}

/// Brute force in the current process, interval by interval.
pub async fn search_sequential(
    pipeline: Arc<MappingPipeline>,
    intervals: Vec<SeedInterval>,
    cancellation_token: CancellationToken,
) -> Result<Value, SearchError> {
    let mut min: Option<Value> = None;
    for (index, interval) in intervals.into_iter().enumerate() {
        let pipeline = pipeline.clone();
        let token = cancellation_token.clone();
        let scan = tokio::task::spawn_blocking(move || {
            compute_min_cancellable(&pipeline, &interval, &token)
        });
        let local = tokio::select! {
            local = scan => local.context("Scanning task panicked")?,
            _ = cancellation_token.cancelled() => None,
        };
        let Some(local) = local else {
            warn!("Search cancelled while scanning interval {index}");
            return Err(SearchError::Cancelled);
        };
        let current = min.map_or(local, |m| m.min(local));
        min = Some(current);
        info!(
            "Interval {index} ({interval}): local min {local}, running min {current}"
        );
    }
    let min = min.ok_or_else(|| SearchError::invalid_config("no seed intervals to search"))?;
    info!("The answer is {min}");
    Ok(min)
}

use std::time::Duration;

use anyhow::Result;
use camino::Utf8PathBuf as PathBuf;
use clap::Parser;

#[derive(Parser)]
#[command(version)]
pub struct Args {
    /// Log span close events together with their durations
    #[clap(long, env, global = true)]
    pub log_span_durations: bool,

    /// Serve Prometheus metrics on this port while the search runs
    #[clap(long, env)]
    pub prometheus_port: Option<u16>,

    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(clap::Subcommand)]
pub enum Mode {
    /// Find the minimum mapped value over all seed intervals
    Search(SearchArgs),
    /// Answer a single request from stdin (spawned by `search`)
    #[command(hide = true)]
    Worker(WorkerArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct SearchArgs {
    /// Almanac file with the seeds line and the map blocks
    #[clap(long, env, value_name = "FILE")]
    pub input: PathBuf,

    #[clap(long, env, value_enum, default_value_t = Strategy::Balanced)]
    pub strategy: Strategy,

    /// Maximum number of workers running at once (defaults to available parallelism)
    #[clap(long, env)]
    pub workers: Option<usize>,

    /// Maximum number of values per unit (defaults to total / workers, rounded up)
    #[clap(long, env)]
    pub chunk_size: Option<i64>,

    #[clap(long, env, value_enum, default_value_t = Backend::Process)]
    pub backend: Backend,

    /// Seconds a single unit may run before it's resubmitted
    #[clap(long, env, value_parser = parse_seconds, default_value = "3600")]
    pub unit_timeout_sec: Duration,

    /// How many times a failed unit is handed to a fresh worker
    #[clap(long, env, default_value_t = 2)]
    pub max_retries: u32,
}

impl SearchArgs {
    pub fn fill_defaults(&mut self) {
        if self.workers.is_none() {
            let workers = std::thread::available_parallelism()
                .map(|x| x.get())
                .unwrap_or(1);
            tracing::info!("Using {workers} workers");
            self.workers = Some(workers);
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct WorkerArgs {
    #[clap(long, value_name = "FILE")]
    pub input: PathBuf,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Every seed is a single value
    Points,
    /// Scan every interval in this process, one after another
    Sequential,
    /// One unit per seed interval
    PerInterval,
    /// Split intervals into about one unit per worker
    Balanced,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// A child process per unit
    Process,
    /// A blocking thread per unit
    Thread,
}

fn parse_seconds(s: &str) -> Result<Duration> {
    Ok(Duration::from_secs(s.parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_defaults() {
        let args = Args::try_parse_from(["minscan", "search", "--input", "a.txt"]).unwrap();
        let Mode::Search(mut search) = args.mode else {
            panic!("expected search mode");
        };
        assert_eq!(search.strategy, Strategy::Balanced);
        assert_eq!(search.backend, Backend::Process);
        assert_eq!(search.unit_timeout_sec, Duration::from_secs(3600));
        assert_eq!(search.max_retries, 2);
        assert_eq!(search.chunk_size, None);
        search.fill_defaults();
        assert!(search.workers.unwrap() > 0);
    }

    #[test]
    fn test_worker_mode() {
        let args = Args::try_parse_from([
            "minscan",
            "--log-span-durations",
            "worker",
            "--input",
            "in.txt",
        ])
        .unwrap();
        assert!(args.log_span_durations);
        assert!(matches!(args.mode, Mode::Worker(WorkerArgs { input }) if input == "in.txt"));
    }

    #[test]
    fn test_strategy_names() {
        let args = Args::try_parse_from([
            "minscan",
            "search",
            "--input",
            "a.txt",
            "--strategy",
            "per-interval",
            "--backend",
            "thread",
            "--unit-timeout-sec",
            "5",
        ])
        .unwrap();
        let Mode::Search(search) = args.mode else {
            panic!("expected search mode");
        };
        assert_eq!(search.strategy, Strategy::PerInterval);
        assert_eq!(search.backend, Backend::Thread);
        assert_eq!(search.unit_timeout_sec, Duration::from_secs(5));
        assert!(Args::try_parse_from(["minscan", "search"]).is_err());
    }
}

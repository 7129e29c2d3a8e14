// minscan, distributed minimum search over interval remapping pipelines.
// Copyright (C) 2024 minscan contributors

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use prometheus_client::metrics::info::Info;
use prometheus_client::registry::Registry;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use minscan::cli::{Args, Mode, SearchArgs};
use minscan::http_server::Server as HttpServer;
use minscan::{controller, metrics, run_all, worker};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

// Stdout belongs to the protocol (worker) or to the answer (search), so logs go to stderr.
fn setup_tracing(args: &Args) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::builder().parse_lossy(
        std::env::var(tracing_subscriber::EnvFilter::DEFAULT_ENV).unwrap_or("info".to_string()),
    );
    let fmt = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_span_events(if args.log_span_durations {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        })
        .with_filter(env_filter);
    tracing_subscriber::registry().with(fmt).try_init()?;
    Ok(())
}

fn create_cancellation_token() -> Result<CancellationToken> {
    use tokio::signal::unix::{signal, SignalKind};

    let token = CancellationToken::new();
    let copy = token.clone();
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::spawn(async move {
        tokio::select!(
            _ = sigint.recv() => {
                copy.cancel();
            },
            _ = sigterm.recv() => {
                copy.cancel();
            },
        );
    });
    Ok(token)
}

async fn search(mut args: SearchArgs, prometheus_port: Option<u16>) -> Result<()> {
    args.fill_defaults(); // tracing should be initialized at this point
    let started = Instant::now();
    let cancellation_token = create_cancellation_token()?;

    let answer = match prometheus_port {
        Some(port) => {
            let info = Info::new(vec![(
                "version".to_owned(),
                env!("CARGO_PKG_VERSION").to_owned(),
            )]);
            let mut metrics_registry = Registry::default();
            metrics::register_metrics(&mut metrics_registry, info);
            let (answer, server_result) = run_all!(
                cancellation_token,
                controller::run_search(args, cancellation_token.child_token()),
                HttpServer::new(metrics_registry).run(port, cancellation_token.child_token()),
            );
            server_result?;
            answer?
        }
        None => controller::run_search(args, cancellation_token).await?,
    };

    tracing::info!("Search finished in {:.3?}", started.elapsed());
    println!("{answer}");
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    setup_tracing(&args)?;
    match args.mode {
        Mode::Search(search_args) => search(search_args, args.prometheus_port).await,
        Mode::Worker(worker_args) => {
            worker::stdio::run(&worker_args.input).await.map_err(|e| {
                tracing::error!("Worker failed: {e:#}");
                e.into()
            })
        }
    }
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    // A worker answers a single CPU-bound request, one thread is all it needs
    let runtime = match args.mode {
        Mode::Worker(_) => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?,
        Mode::Search(_) => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?,
    };
    let result = runtime.block_on(run(args));
    // Cancelled in-process scans notice the token within a few milliseconds
    runtime.shutdown_timeout(Duration::from_secs(5));
    result
}

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio_util::sync::CancellationToken;

use crate::{
    mapping::MappingPipeline,
    protocol::{WorkerRequest, WorkerResult},
};

use super::{compute::compute_min_cancellable, Launcher};

/// Runs each unit on tokio's blocking thread pool inside the current process.
/// Dropping the launch future stops the scan, so a timed-out unit frees its thread.
#[derive(Clone)]
pub struct LocalLauncher {
    pipeline: Arc<MappingPipeline>,
}

impl LocalLauncher {
    pub fn new(pipeline: Arc<MappingPipeline>) -> Self {
        Self { pipeline }
    }
}

impl Launcher for LocalLauncher {
    fn launch(
        &self,
        request: WorkerRequest,
    ) -> impl futures::Future<Output = Result<WorkerResult>> + Send {
        let pipeline = self.pipeline.clone();
        async move {
            let interval = request.seed_interval()?;
            let token = CancellationToken::new();
            let _stop_on_drop = token.clone().drop_guard();
            let min = tokio::task::spawn_blocking(move || {
                compute_min_cancellable(&pipeline, &interval, &token)
            })
            .await
            .map_err(|e| anyhow::Error::new(e).context("Scanning task panicked"))?
            .ok_or_else(|| anyhow!("Scan was cancelled"))?;
            Ok(WorkerResult {
                unit_id: request.unit_id,
                interval: request.interval,
                min,
            })
        }
    }
}

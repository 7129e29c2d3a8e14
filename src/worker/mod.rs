pub mod compute;
pub mod local;
pub mod process;
pub mod stdio;

use anyhow::Result;

use crate::protocol::{WorkerRequest, WorkerResult};

pub use compute::{compute_min, compute_min_cancellable};
pub use local::LocalLauncher;
pub use process::ProcessLauncher;

/// Runs a single request in a fresh, isolated execution context.
/// Dropping the returned future abandons the worker.
pub trait Launcher: Send + Sync {
    fn launch(
        &self,
        request: WorkerRequest,
    ) -> impl futures::Future<Output = Result<WorkerResult>> + Send;
}

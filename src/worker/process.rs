use std::process::Stdio;

use anyhow::{bail, Context, Result};
use camino::{Utf8Path as Path, Utf8PathBuf as PathBuf};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    process::Command,
};
use tracing::{debug, instrument};

use crate::protocol::{encode_line, WorkerRequest, WorkerResult};

use super::Launcher;

/// Spawns one OS process per unit, running the `worker` subcommand of `program`.
/// The child re-reads the input file to build its own copy of the pipeline.
pub struct ProcessLauncher {
    program: PathBuf,
    input: PathBuf,
}

impl ProcessLauncher {
    pub fn new(program: PathBuf, input: PathBuf) -> Self {
        Self { program, input }
    }

    pub fn with_current_exe(input: &Path) -> Result<Self> {
        let exe = std::env::current_exe().context("Couldn't locate current executable")?;
        let program = PathBuf::try_from(exe).context("Executable path is not UTF-8")?;
        Ok(Self::new(program, input.to_owned()))
    }
}

impl Launcher for ProcessLauncher {
    fn launch(
        &self,
        request: WorkerRequest,
    ) -> impl futures::Future<Output = Result<WorkerResult>> + Send {
        self.run_child(request)
    }
}

impl ProcessLauncher {
    #[instrument(skip_all, fields(unit = %request.unit_id))]
    async fn run_child(&self, request: WorkerRequest) -> Result<WorkerResult> {
        let mut child = Command::new(&self.program)
            .arg("worker")
            .arg("--input")
            .arg(&self.input)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Couldn't spawn worker '{}'", self.program))?;
        debug!("Spawned worker {:?}", child.id());

        let mut stdin = child.stdin.take().context("Worker stdin is not piped")?;
        stdin
            .write_all(encode_line(&request)?.as_bytes())
            .await
            .context("Couldn't send request")?;
        drop(stdin);

        let stdout = child.stdout.take().context("Worker stdout is not piped")?;
        let mut line = String::new();
        BufReader::new(stdout)
            .read_line(&mut line)
            .await
            .context("Couldn't read worker result")?;

        let status = child.wait().await?;
        if !status.success() {
            bail!("Worker for {} exited with {status}", request.interval);
        }
        if line.trim().is_empty() {
            bail!("Worker for {} exited without a result", request.interval);
        }
        WorkerResult::decode(&line).context("Invalid worker result")
    }
}

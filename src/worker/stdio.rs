use anyhow::Context;
use camino::Utf8Path as Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument};

use crate::{
    almanac::Almanac,
    error::SearchError,
    mapping::MappingPipeline,
    protocol::{encode_line, WorkerRequest, WorkerResult},
};

use super::compute::compute_min;

/// Child-process side of the protocol: reads one request, answers it and returns.
/// A missing or malformed request is an error and nothing is written back.
pub async fn serve<R, W>(
    pipeline: &MappingPipeline,
    mut reader: R,
    mut writer: W,
) -> Result<WorkerResult, SearchError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .await
        .context("Couldn't read request")?;
    if line.trim().is_empty() {
        return Err(SearchError::MalformedRequest(
            "no request received".to_owned(),
        ));
    }
    let request = WorkerRequest::decode(&line)?;
    let interval = request.seed_interval()?;
    debug!("Scanning {interval} for unit {}", request.unit_id);

    let min = compute_min(pipeline, &interval);
    let result = WorkerResult {
        unit_id: request.unit_id,
        interval: request.interval,
        min,
    };
    writer
        .write_all(encode_line(&result)?.as_bytes())
        .await
        .context("Couldn't send result")?;
    writer.flush().await.context("Couldn't send result")?;
    Ok(result)
}

#[instrument(skip_all, fields(pid = std::process::id()))]
pub async fn run(input: &Path) -> Result<(), SearchError> {
    let almanac = Almanac::load(input).await?;
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let result = serve(&almanac.pipeline, stdin, tokio::io::stdout()).await?;
    info!(
        "Worker sent answer for unit {} ({}): {}",
        result.unit_id, result.interval, result.min
    );
    Ok(())
}

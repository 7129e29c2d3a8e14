//! Messages exchanged between the orchestrator and a worker process.
//!
//! One request goes down the worker's stdin and one result comes back on its
//! stdout, each as a single line of JSON.

use serde::{Deserialize, Serialize};

use crate::{
    error::SearchError,
    mapping::Value,
    types::interval::{SeedInterval, UnitId},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorkerRequest {
    pub unit_id: UnitId,
    pub interval: String,
    pub start: Value,
    pub count: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorkerResult {
    pub unit_id: UnitId,
    pub interval: String,
    pub min: Value,
}

impl WorkerRequest {
    pub fn new(unit_id: UnitId, interval: &SeedInterval) -> Self {
        Self {
            unit_id,
            interval: interval.label(),
            start: interval.start(),
            count: interval.count(),
        }
    }

    pub fn decode(line: &str) -> Result<Self, SearchError> {
        serde_json::from_str(line.trim())
            .map_err(|e| SearchError::MalformedRequest(format!("Couldn't parse request: {e}")))
    }

    /// Checks that the bounds describe a valid interval and agree with the label.
    pub fn seed_interval(&self) -> Result<SeedInterval, SearchError> {
        let interval = SeedInterval::new(self.start, self.count)
            .map_err(|e| SearchError::MalformedRequest(e.to_string()))?;
        if interval.label() != self.interval {
            return Err(SearchError::MalformedRequest(format!(
                "interval label '{}' doesn't match bounds {interval}",
                self.interval
            )));
        }
        Ok(interval)
    }
}

impl WorkerResult {
    pub fn decode(line: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(line.trim())?)
    }
}

pub fn encode_line<T: Serialize>(message: &T) -> anyhow::Result<String> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

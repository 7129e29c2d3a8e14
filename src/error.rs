use itertools::Itertools;

use crate::types::interval::UnitId;

#[derive(thiserror::Error, Debug)]
pub enum SearchError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
    #[error("Result for unknown unit {unit} ({interval})")]
    StaleOrUnknownResult { unit: UnitId, interval: String },
    #[error("Search stalled, units never completed: {}", .0.iter().join(", "))]
    StalledCompletion(Vec<UnitId>),
    #[error("Search cancelled")]
    Cancelled,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SearchError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

use serde::{Deserialize, Serialize};

use crate::{error::SearchError, mapping::Value};

/// Unique id of a unit of work, assigned in creation order.
#[derive(PartialOrd, Ord, PartialEq, Eq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct UnitId(u64);

impl UnitId {
    pub const fn new(id: u64) -> Self {
        UnitId(id)
    }

    pub fn next(self) -> Self {
        UnitId(self.0 + 1)
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Half-open range `[start, start + count)`.
#[derive(PartialEq, Eq, Clone, Copy, Hash)]
pub struct SeedInterval {
    start: Value,
    count: Value,
}

impl SeedInterval {
    pub fn new(start: Value, count: Value) -> Result<Self, SearchError> {
        if count <= 0 {
            return Err(SearchError::invalid_config(format!(
                "interval count must be positive, got {count} for start {start}"
            )));
        }
        if start.checked_add(count).is_none() {
            return Err(SearchError::invalid_config(format!(
                "interval {start}-{count} exceeds the value range"
            )));
        }
        Ok(Self { start, count })
    }

    pub fn start(&self) -> Value {
        self.start
    }

    pub fn count(&self) -> Value {
        self.count
    }

    pub fn end(&self) -> Value {
        self.start + self.count
    }

    pub fn values(&self) -> std::ops::Range<Value> {
        self.start..self.end()
    }

    /// Descriptive identity. Not unique across unrelated interval sets.
    pub fn label(&self) -> String {
        format!("{}-{}", self.start, self.count)
    }

    /// Cuts the interval into consecutive pieces of at most `max_chunk` values.
    pub fn split(&self, max_chunk: Value) -> Result<Vec<SeedInterval>, SearchError> {
        if max_chunk <= 0 {
            return Err(SearchError::invalid_config(format!(
                "chunk size must be positive, got {max_chunk}"
            )));
        }
        let mut result = Vec::with_capacity(ceil_div(self.count, max_chunk) as usize);
        let mut start = self.start;
        let mut remaining = self.count;
        while remaining > max_chunk {
            result.push(SeedInterval {
                start,
                count: max_chunk,
            });
            start += max_chunk;
            remaining -= max_chunk;
        }
        result.push(SeedInterval {
            start,
            count: remaining,
        });
        Ok(result)
    }
}

impl std::fmt::Display for SeedInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.count)
    }
}

impl std::fmt::Debug for SeedInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self, f)
    }
}

pub fn split_all(
    intervals: &[SeedInterval],
    max_chunk: Value,
) -> Result<Vec<SeedInterval>, SearchError> {
    let mut result = Vec::new();
    for interval in intervals {
        result.extend(interval.split(max_chunk)?);
    }
    Ok(result)
}

pub fn total_count(intervals: &[SeedInterval]) -> Value {
    intervals
        .iter()
        .fold(0, |acc: Value, interval| acc.saturating_add(interval.count))
}

/// `ceil(total / parallelism)`, so that splitting yields about `parallelism` chunks
/// no matter how many raw intervals there are.
pub fn chunk_size_for(intervals: &[SeedInterval], parallelism: usize) -> Result<Value, SearchError> {
    if parallelism == 0 {
        return Err(SearchError::invalid_config("parallelism must be positive"));
    }
    let total = total_count(intervals);
    if total == 0 {
        return Err(SearchError::invalid_config("no seed intervals to search"));
    }
    let parallelism = Value::try_from(parallelism).unwrap_or(Value::MAX);
    Ok(ceil_div(total, parallelism))
}

fn ceil_div(a: Value, b: Value) -> Value {
    a / b + Value::from(a % b != 0)
}

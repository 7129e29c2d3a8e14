use itertools::Itertools;
use tracing::info;

use crate::{
    mapping::Value,
    types::interval::{SeedInterval, UnitId},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialResult {
    pub unit_id: UnitId,
    pub interval: SeedInterval,
    pub min: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport {
    pub partials: Vec<PartialResult>,
    pub global_min: Value,
}

impl SearchReport {
    /// `None` when there is nothing to reduce.
    pub fn from_partials(partials: Vec<PartialResult>) -> Option<Self> {
        let global_min = partials.iter().map(|p| p.min).min()?;
        Some(Self {
            partials,
            global_min,
        })
    }

    pub fn log(&self) {
        info!(
            "The answers are [{}]",
            self.partials
                .iter()
                .map(|p| format!("{} {}: {}", p.unit_id, p.interval, p.min))
                .join(", ")
        );
        info!("The answer is {}", self.global_min);
    }
}

impl std::fmt::Display for SearchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:>8}  {:>24}  {:>20}", "unit", "interval", "min")?;
        for p in &self.partials {
            writeln!(
                f,
                "{:>8}  {:>24}  {:>20}",
                p.unit_id.to_string(),
                p.interval.to_string(),
                p.min
            )?;
        }
        write!(f, "global min: {}", self.global_min)
    }
}

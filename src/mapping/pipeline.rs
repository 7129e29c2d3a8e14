use super::range_map::{RangeMap, Value};

/// Ordered chain of stages. Immutable once built, so a single instance can be
/// shared read-only between any number of scanning threads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingPipeline {
    stages: Vec<RangeMap>,
}

impl MappingPipeline {
    pub fn new(stages: Vec<RangeMap>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[RangeMap] {
        &self.stages
    }

    #[inline]
    pub fn apply(&self, value: Value) -> Value {
        self.stages.iter().fold(value, |acc, stage| stage.apply(acc))
    }

    /// Every intermediate value, starting with the input. Used for debug output.
    pub fn trace(&self, value: Value) -> Vec<(&str, Value)> {
        let mut result = Vec::with_capacity(self.stages.len() + 1);
        result.push(("input", value));
        let mut current = value;
        for stage in &self.stages {
            current = stage.apply(current);
            result.push((stage.name(), current));
        }
        result
    }
}

impl FromIterator<RangeMap> for MappingPipeline {
    fn from_iter<I: IntoIterator<Item = RangeMap>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

use std::collections::{BTreeMap, VecDeque};

use itertools::Itertools;
use tracing::{info, instrument};

use crate::{
    mapping::Value,
    protocol::WorkerResult,
    types::interval::{SeedInterval, UnitId},
};

use super::report::{PartialResult, SearchReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitStatus {
    Pending,
    InFlight,
    Completed(Value),
    Failed,
}

#[derive(Debug, Clone)]
pub struct WorkUnit {
    pub id: UnitId,
    pub interval: SeedInterval,
    pub status: UnitStatus,
    pub attempts: u32,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RecordStatus {
    Recorded,
    Duplicate,
    Unknown,
}

#[derive(Debug, PartialEq, Eq)]
pub enum FailureStatus {
    Resubmitted { attempts: u32 },
    Exhausted { attempts: u32 },
    Ignored,
}

/// Bookkeeping for every unit of one search. Owned by the dispatch loop and only
/// mutated from it, so it needs no synchronization.
#[derive(Debug, Default)]
pub struct SearchState {
    units: BTreeMap<UnitId, WorkUnit>,
    queue: VecDeque<UnitId>, // only ids of pending units, in dispatch order
    max_retries: u32,
}

impl SearchState {
    pub fn new(intervals: impl IntoIterator<Item = SeedInterval>, max_retries: u32) -> Self {
        let mut units = BTreeMap::new();
        let mut queue = VecDeque::new();
        let mut id = UnitId::new(0);
        for interval in intervals {
            units.insert(
                id,
                WorkUnit {
                    id,
                    interval,
                    status: UnitStatus::Pending,
                    attempts: 0,
                },
            );
            queue.push_back(id);
            id = id.next();
        }
        Self {
            units,
            queue,
            max_retries,
        }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, id: UnitId) -> Option<&WorkUnit> {
        self.units.get(&id)
    }

    pub fn take_next_dispatch(&mut self) -> Option<(UnitId, SeedInterval)> {
        while let Some(id) = self.queue.pop_front() {
            let Some(unit) = self.units.get_mut(&id) else {
                continue;
            };
            if unit.status != UnitStatus::Pending {
                continue;
            }
            unit.status = UnitStatus::InFlight;
            unit.attempts += 1;
            return Some((id, unit.interval));
        }
        None
    }

    /// Results are matched by id and checked against the unit's interval.
    /// The first accepted result is final.
    pub fn record_result(&mut self, result: &WorkerResult) -> RecordStatus {
        let Some(unit) = self.units.get_mut(&result.unit_id) else {
            return RecordStatus::Unknown;
        };
        if unit.interval.label() != result.interval {
            return RecordStatus::Unknown;
        }
        match unit.status {
            UnitStatus::Completed(_) => RecordStatus::Duplicate,
            UnitStatus::Pending | UnitStatus::InFlight | UnitStatus::Failed => {
                unit.status = UnitStatus::Completed(result.min);
                RecordStatus::Recorded
            }
        }
    }

    pub fn record_failure(&mut self, id: UnitId) -> FailureStatus {
        let Some(unit) = self.units.get_mut(&id) else {
            return FailureStatus::Ignored;
        };
        if unit.status != UnitStatus::InFlight {
            return FailureStatus::Ignored;
        }
        if unit.attempts <= self.max_retries {
            unit.status = UnitStatus::Pending;
            self.queue.push_back(id);
            FailureStatus::Resubmitted {
                attempts: unit.attempts,
            }
        } else {
            unit.status = UnitStatus::Failed;
            FailureStatus::Exhausted {
                attempts: unit.attempts,
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.units
            .values()
            .all(|unit| matches!(unit.status, UnitStatus::Completed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.units
            .values()
            .any(|unit| unit.status == UnitStatus::Failed)
    }

    /// Units that haven't reported a result yet, including failed ones.
    pub fn unfinished(&self) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|unit| !matches!(unit.status, UnitStatus::Completed(_)))
            .map(|unit| unit.id)
            .collect()
    }

    pub fn failed(&self) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|unit| unit.status == UnitStatus::Failed)
            .map(|unit| unit.id)
            .collect()
    }

    /// The final report, once every unit has completed.
    #[instrument(skip_all)]
    pub fn report(&self) -> Option<SearchReport> {
        if !self.is_complete() {
            return None;
        }
        let partials = self
            .units
            .values()
            .filter_map(|unit| match unit.status {
                UnitStatus::Completed(min) => Some(PartialResult {
                    unit_id: unit.id,
                    interval: unit.interval,
                    min,
                }),
                _ => None,
            })
            .collect();
        SearchReport::from_partials(partials)
    }

    pub fn report_pending(&self) {
        let unfinished = self.unfinished();
        info!(
            "Units pending: {} of {} [{}]",
            unfinished.len(),
            self.units.len(),
            unfinished
                .iter()
                .map(|id| format!("{id} {}", self.units[id].interval))
                .join(", ")
        );
    }
}

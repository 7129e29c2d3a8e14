//! Distributed brute-force search for the smallest value reachable through a
//! chain of interval remapping stages.
//!
//! - `mapping`: the remap rules, stages and the pipeline folding a value through them.
//! - `types::interval`: seed intervals, unit ids and the splitter.
//! - `almanac`: parsing of the seeds line and map blocks.
//! - `protocol` and `worker`: the request/response exchange and the compute unit,
//!   run either as child processes or on blocking threads.
//! - `controller`: the orchestrator owning every unit's state, the bounded worker
//!   pool, deadlines, resubmission and the final reduction.

pub mod almanac;
pub mod cli;
pub mod controller;
pub mod error;
pub mod http_server;
pub mod mapping;
pub mod metrics;
pub mod protocol;
pub mod types;
#[macro_use]
pub mod util;
pub mod worker;

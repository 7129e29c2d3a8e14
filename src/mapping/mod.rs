pub mod pipeline;
pub mod range_map;

pub use pipeline::MappingPipeline;
pub use range_map::{RangeMap, Rule, Value};

use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::info::Info;
use prometheus_client::registry::Registry;

lazy_static::lazy_static! {
    pub static ref UNITS_DISPATCHED: Counter = Default::default();
    pub static ref UNITS_COMPLETED: Counter = Default::default();
    pub static ref UNITS_RESUBMITTED: Counter = Default::default();
    pub static ref STALE_RESULTS: Counter = Default::default();
    pub static ref VALUES_SCANNED: Counter = Default::default();
}

pub fn register_metrics(registry: &mut Registry, info: Info<Vec<(String, String)>>) {
    registry.register("minscan_info", "Search info", info);
    registry.register(
        "num_units_dispatched",
        "Number of work units handed to a worker, including resubmissions",
        UNITS_DISPATCHED.clone(),
    );
    registry.register(
        "num_units_completed",
        "Number of work units with a recorded minimum",
        UNITS_COMPLETED.clone(),
    );
    registry.register(
        "num_units_resubmitted",
        "Number of work units queued again after a failed or timed out worker",
        UNITS_RESUBMITTED.clone(),
    );
    registry.register(
        "num_stale_results",
        "Number of worker results that didn't match any tracked unit",
        STALE_RESULTS.clone(),
    );
    registry.register(
        "num_values_scanned",
        "Number of values run through the pipeline by completed units",
        VALUES_SCANNED.clone(),
    );
}

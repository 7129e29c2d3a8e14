use tokio_util::sync::CancellationToken;

use crate::{
    mapping::{MappingPipeline, Value},
    types::interval::SeedInterval,
};

// Values scanned between two looks at the cancellation token
const CANCEL_CHECK_STRIDE: Value = 1 << 16;

/// Runs every value of the interval through the pipeline and returns the smallest result.
/// Sequential and CPU bound; parallelism only exists across intervals.
pub fn compute_min(pipeline: &MappingPipeline, interval: &SeedInterval) -> Value {
    interval
        .values()
        .fold(Value::MAX, |min, value| min.min(pipeline.apply(value)))
}

/// Same scan as [`compute_min`], but gives up with `None` soon after the token is cancelled.
/// Meant for scans on shared threads, which can't be aborted from the outside.
pub fn compute_min_cancellable(
    pipeline: &MappingPipeline,
    interval: &SeedInterval,
    cancellation_token: &CancellationToken,
) -> Option<Value> {
    let mut min = Value::MAX;
    let mut start = interval.start();
    let end = interval.end();
    while start < end {
        if cancellation_token.is_cancelled() {
            return None;
        }
        let stop = end.min(start.saturating_add(CANCEL_CHECK_STRIDE));
        min = (start..stop).fold(min, |min, value| min.min(pipeline.apply(value)));
        start = stop;
    }
    Some(min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        almanac::Almanac,
        mapping::{RangeMap, Rule},
        types::interval::split_all,
    };

    use std::time::{Duration, Instant};

    fn example() -> Almanac {
        std::fs::read_to_string(crate::util::tests::fixture("almanac.txt"))
            .unwrap()
            .parse()
            .unwrap()
    }

    #[test]
    fn test_identity_scenario() {
        let pipeline =
            MappingPipeline::new(vec![RangeMap::new("s", vec![Rule::new(50, 98, 2).unwrap()])]);
        let interval = SeedInterval::new(79, 14).unwrap();
        assert_eq!(compute_min(&pipeline, &interval), 79);

        let covering = SeedInterval::new(95, 5).unwrap();
        assert_eq!(compute_min(&pipeline, &covering), 50);
    }

    #[test]
    fn test_single_value() {
        let almanac = example();
        let interval = SeedInterval::new(13, 1).unwrap();
        assert_eq!(compute_min(&almanac.pipeline, &interval), 35);
    }

    #[test]
    fn test_chunk_minima_match_direct_scan() {
        let almanac = example();
        let intervals = almanac.seed_intervals().unwrap();
        let direct = intervals
            .iter()
            .map(|i| compute_min(&almanac.pipeline, i))
            .min()
            .unwrap();
        assert_eq!(direct, 46);
        for max_chunk in [1, 2, 5, 13, 14, 100] {
            let chunked = split_all(&intervals, max_chunk)
                .unwrap()
                .iter()
                .map(|i| compute_min(&almanac.pipeline, i))
                .min()
                .unwrap();
            assert_eq!(chunked, direct, "chunk size {max_chunk}");
        }
    }

    #[test]
    fn test_cancellable_scan_matches_plain_scan() {
        let almanac = example();
        let token = CancellationToken::new();
        for interval in [
            SeedInterval::new(79, 14).unwrap(),
            SeedInterval::new(0, 3 * CANCEL_CHECK_STRIDE + 17).unwrap(),
        ] {
            assert_eq!(
                compute_min_cancellable(&almanac.pipeline, &interval, &token),
                Some(compute_min(&almanac.pipeline, &interval))
            );
        }
    }

    #[test]
    fn test_cancelled_scan_stops_promptly() {
        let almanac = example();
        let huge = SeedInterval::new(0, 1_000_000_000_000).unwrap();
        let token = CancellationToken::new();
        let canceller = {
            let token = token.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(50));
                token.cancel();
            })
        };
        let started = Instant::now();
        assert_eq!(compute_min_cancellable(&almanac.pipeline, &huge, &token), None);
        assert!(started.elapsed() < Duration::from_secs(10));
        canceller.join().unwrap();
    }
}

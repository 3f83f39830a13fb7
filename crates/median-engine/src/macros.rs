/// Times `$block`, records the elapsed nanoseconds in `$engine` and returns
/// `(result, elapsed)`.
///
/// `$engine` is anything with an `insert(u128)` method, such as a
/// `MedianFinder<u128>` or a `SharedMedian<u128, _>`.
#[macro_export]
macro_rules! record_elapsed {
    ($engine:expr, $block:block) => {{
        let start = ::std::time::Instant::now();
        let result = { $block };
        let duration = start.elapsed();
        $engine.insert(duration.as_nanos());
        $crate::tracing::trace!(?duration, "Recorded elapsed time");
        (result, duration)
    }};
}

#[cfg(test)]
mod tests {
    use crate::{MedianFinder, SharedMedian};
    use std::time::Duration;

    #[test]
    fn test_records_into_finder() {
        let mut latencies = MedianFinder::<u128>::new();
        let (value, elapsed) = record_elapsed!(latencies, {
            std::thread::sleep(Duration::from_millis(2));
            7
        });
        assert_eq!(value, 7);
        assert!(elapsed >= Duration::from_millis(2));
        assert_eq!(latencies.len(), 1);
        assert_eq!(latencies.median(), Ok(elapsed.as_nanos() as f64));
    }

    #[test]
    fn test_records_into_shared() {
        let latencies: SharedMedian<u128, MedianFinder<u128>> = SharedMedian::default();
        for _ in 0..3 {
            let _ = record_elapsed!(latencies, { 1 + 1 });
        }
        assert_eq!(latencies.len(), 3);
        assert!(latencies.median().is_ok());
    }
}

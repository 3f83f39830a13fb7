use crate::observation::Observation;

/// Median computed by sorting from scratch.
pub(crate) fn sorted_median<T: Observation>(values: &[T]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid].to_f64()
    } else {
        sorted[mid - 1].midpoint(sorted[mid])
    }
}

/// Routes engine events to the test output. Safe to call from every test.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

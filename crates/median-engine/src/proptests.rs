use std::num::NonZeroUsize;

use ordered_float::OrderedFloat;
use proptest::{collection::vec, prelude::*};

use crate::test_util::sorted_median;
use crate::{BoundedMedianFinder, MedianError, MedianFinder, SlidingWindowMedian, StreamingMedian};

prop_compose! {
    /// Small value range so duplicates are common
    fn stream()(values in vec(-50..=50i32, 0..400)) -> Vec<i32> {
        values
    }
}

prop_compose! {
    fn windowed_stream()
        (width in 1..40usize, values in vec(-50..=50i32, 0..400))
    -> (NonZeroUsize, Vec<i32>) {
        (NonZeroUsize::new(width).unwrap(), values)
    }
}

prop_compose! {
    fn float_stream()(values in vec(-1.0e6..1.0e6f64, 1..200)) -> Vec<OrderedFloat<f64>> {
        values.into_iter().map(OrderedFloat).collect()
    }
}

fn assert_tracks_window<E: StreamingMedian<i32>>(
    engine: &mut E,
    width: usize,
    values: &[i32],
) -> Result<(), TestCaseError> {
    prop_assert_eq!(engine.median(), Err(MedianError::EmptyStructure));
    for (i, &value) in values.iter().enumerate() {
        engine.insert(value);
        prop_assert!(engine.check_invariants().is_ok(), "{:?}", engine.check_invariants());
        let live = &values[(i + 1).saturating_sub(width)..=i];
        prop_assert_eq!(engine.len(), live.len());
        let median = engine.median();
        prop_assert_eq!(median.clone(), Ok(sorted_median(live)));
        // A second read without an update must not change anything.
        prop_assert_eq!(engine.median(), median);
    }
    Ok(())
}

proptest! {
    #[test]
    fn unbounded_matches_sorting(values in stream()) {
        let mut finder = MedianFinder::new();
        assert_tracks_window(&mut finder, usize::MAX, &values)?;
    }

    #[test]
    fn sliding_matches_sorting((width, values) in windowed_stream()) {
        let mut window = SlidingWindowMedian::new(width);
        assert_tracks_window(&mut window, width.get(), &values)?;
    }

    #[test]
    fn bounded_matches_sorting((width, values) in windowed_stream()) {
        let mut finder = BoundedMedianFinder::new(width);
        assert_tracks_window(&mut finder, width.get(), &values)?;
    }

    #[test]
    fn lazy_and_eager_windows_agree((width, values) in windowed_stream()) {
        let mut lazy = SlidingWindowMedian::new(width);
        let mut eager = BoundedMedianFinder::new(width);
        for value in values {
            lazy.insert(value);
            eager.insert(value);
            prop_assert_eq!(lazy.median(), eager.median());
            prop_assert!(lazy.window().eq(eager.window()));
        }
    }

    #[test]
    fn float_windows_match_sorting(values in float_stream(), width in 1..20usize) {
        let width = NonZeroUsize::new(width).unwrap();
        let mut lazy = SlidingWindowMedian::new(width);
        let mut eager = BoundedMedianFinder::new(width);
        for i in 0..values.len() {
            lazy.insert(values[i]);
            eager.insert(values[i]);
            let live = &values[(i + 1).saturating_sub(width.get())..=i];
            prop_assert_eq!(lazy.median(), Ok(sorted_median(live)));
            prop_assert_eq!(eager.median(), Ok(sorted_median(live)));
        }
    }
}

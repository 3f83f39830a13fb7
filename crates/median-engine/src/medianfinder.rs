use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::error::MedianError;
use crate::halves::{self, Halves};
use crate::observation::Observation;
use crate::StreamingMedian;

/// Running median over every value inserted so far.
#[derive(Debug, Clone)]
pub struct MedianFinder<T: Observation> {
    max_heap: BinaryHeap<T>,          // Max-heap for the lower half
    min_heap: BinaryHeap<Reverse<T>>, // Min-heap for the upper half (using Reverse)
}

impl<T: Observation> Default for MedianFinder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Observation> MedianFinder<T> {
    pub fn new() -> Self {
        Self {
            max_heap: BinaryHeap::new(),
            min_heap: BinaryHeap::new(),
        }
    }

    pub fn insert(&mut self, value: T) {
        match self.max_heap.peek() {
            Some(&lower_max) if value > lower_max => self.min_heap.push(Reverse(value)),
            _ => self.max_heap.push(value),
        }
        halves::rebalance(self);
        tracing::trace!(?value, live = self.len(), "Inserted observation");
    }

    /**
    Returns the middle value for an odd count and the mean of the two middle values
    for an even count. Asking an empty finder is an error rather than a silent zero.
    */
    pub fn median(&self) -> Result<f64, MedianError> {
        halves::median_from(
            self.max_heap.len(),
            self.min_heap.len(),
            self.max_heap.peek().copied(),
            self.min_heap.peek().map(|top| top.0),
        )
    }

    pub fn len(&self) -> usize {
        self.max_heap.len() + self.min_heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.max_heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.max_heap.clear();
        self.min_heap.clear();
    }

    pub fn check_invariants(&self) -> Result<(), MedianError> {
        if let Some(error) = halves::balance_violation(self.max_heap.len(), self.min_heap.len()) {
            return Err(error);
        }
        let low_top = self.max_heap.peek().copied();
        let high_top = self.min_heap.peek().map(|top| top.0);
        match halves::order_violation(low_top, high_top) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl<T: Observation> Halves for MedianFinder<T> {
    fn low_len(&self) -> usize {
        self.max_heap.len()
    }

    fn high_len(&self) -> usize {
        self.min_heap.len()
    }

    fn shift_low_to_high(&mut self) {
        if let Some(max_heap_top) = self.max_heap.pop() {
            self.min_heap.push(Reverse(max_heap_top));
        }
    }

    fn shift_high_to_low(&mut self) {
        if let Some(Reverse(min_heap_top)) = self.min_heap.pop() {
            self.max_heap.push(min_heap_top);
        }
    }
}

impl<T: Observation> StreamingMedian<T> for MedianFinder<T> {
    fn insert(&mut self, value: T) {
        MedianFinder::insert(self, value);
    }

    fn median(&mut self) -> Result<f64, MedianError> {
        MedianFinder::median(self)
    }

    fn len(&self) -> usize {
        MedianFinder::len(self)
    }

    fn check_invariants(&self) -> Result<(), MedianError> {
        MedianFinder::check_invariants(self)
    }
}

impl<T: Observation> Extend<T> for MedianFinder<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T: Observation> FromIterator<T> for MedianFinder<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut finder = MedianFinder::new();
        finder.extend(iter);
        finder
    }
}

#[cfg(test)]
mod tests {
    use super::MedianFinder;
    use crate::error::MedianError;
    use crate::test_util::sorted_median;
    use ordered_float::OrderedFloat;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_empty_median_finder() {
        let median_finder = MedianFinder::<i64>::new();
        assert_eq!(median_finder.median(), Err(MedianError::EmptyStructure));
        assert!(median_finder.is_empty());
    }

    #[test]
    fn test_single_element() {
        let mut median_finder = MedianFinder::new();
        median_finder.insert(5);
        assert_eq!(median_finder.median(), Ok(5.0));
    }

    #[test]
    fn test_two_elements() {
        let mut median_finder = MedianFinder::new();
        median_finder.insert(1);
        median_finder.insert(2);
        assert_eq!(median_finder.median(), Ok(1.5));
        median_finder.insert(3);
        assert_eq!(median_finder.median(), Ok(2.0));
    }

    #[test]
    fn test_duplicates_and_ties() {
        let mut median_finder = MedianFinder::new();
        let expected = [6.0, 8.0, 6.0, 6.0, 6.0];
        for (value, expected) in [6, 10, 2, 6, 5].into_iter().zip(expected) {
            median_finder.insert(value);
            assert_eq!(median_finder.median(), Ok(expected));
            median_finder.check_invariants().unwrap();
        }
    }

    #[test]
    fn test_negative_values() {
        let median_finder: MedianFinder<i32> = [-5, -1, -3].into_iter().collect();
        assert_eq!(median_finder.median(), Ok(-3.0));
    }

    #[test]
    fn test_zero_is_a_real_median() {
        let median_finder: MedianFinder<i32> = [-1, 0, 1].into_iter().collect();
        assert_eq!(median_finder.median(), Ok(0.0));
    }

    #[test]
    fn test_large_numbers() {
        let mut median_finder = MedianFinder::<u128>::new();
        median_finder.insert(1_000_000_000);
        median_finder.insert(2_000_000_000);
        median_finder.insert(3_000_000_000);
        assert_eq!(median_finder.median(), Ok(2_000_000_000.0));
    }

    #[test]
    fn test_wide_latencies_average_exactly() {
        let mut median_finder = MedianFinder::<u128>::new();
        median_finder.insert(1);
        median_finder.insert((1 << 53) + 1);
        assert_eq!(median_finder.median(), Ok(((1u128 << 52) + 1) as f64));
    }

    #[test]
    fn test_large_even_number_of_elements() {
        let median_finder: MedianFinder<u32> = (1..=100).collect();
        assert_eq!(median_finder.median(), Ok(50.5));
        assert_eq!(median_finder.len(), 100);
    }

    #[test]
    fn test_large_odd_number_of_elements() {
        let median_finder: MedianFinder<u32> = (1..=101).rev().collect();
        assert_eq!(median_finder.median(), Ok(51.0));
    }

    #[test]
    fn test_interleaved_elements() {
        let median_finder: MedianFinder<i32> = [1, 100, 2, 99, 3, 98].into_iter().collect();
        // Sorted: [1, 2, 3, 98, 99, 100]
        assert_eq!(median_finder.median(), Ok(50.5));
    }

    #[test]
    fn test_float_observations() {
        let median_finder: MedianFinder<OrderedFloat<f64>> =
            [0.5, -1.25, 3.0, 2.0].into_iter().map(OrderedFloat).collect();
        assert_eq!(median_finder.median(), Ok(1.25));
    }

    #[test]
    fn test_median_is_repeatable() {
        let median_finder: MedianFinder<i32> = [4, 8, 15, 16].into_iter().collect();
        assert_eq!(median_finder.median(), median_finder.median());
    }

    #[test]
    fn test_clear_resets() {
        let mut median_finder: MedianFinder<i32> = (0..10).collect();
        median_finder.clear();
        assert!(median_finder.is_empty());
        assert_eq!(median_finder.median(), Err(MedianError::EmptyStructure));
        median_finder.insert(3);
        assert_eq!(median_finder.median(), Ok(3.0));
    }

    #[test]
    fn test_random_stream_matches_sorting() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut median_finder = MedianFinder::new();
        let mut all = Vec::new();
        for _ in 0..2_000 {
            let value = rng.gen_range(-500..=500i64);
            median_finder.insert(value);
            all.push(value);
            median_finder.check_invariants().unwrap();
            assert_eq!(median_finder.median(), Ok(sorted_median(&all)));
        }
    }
}

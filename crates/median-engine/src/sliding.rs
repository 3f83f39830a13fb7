use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::num::NonZeroUsize;

use crate::error::MedianError;
use crate::halves::{self, Halves};
use crate::observation::Observation;
use crate::StreamingMedian;

/// Median of the most recent `width` observations.
///
/// Expired values are not searched for inside the heaps. They are recorded in
/// `pending` and dropped once they surface at a heap top. `low_len` and
/// `high_len` count live entries only, so they can be smaller than the
/// physical heap sizes. Tombstones that never surface (a steadily rising or
/// falling stream) are reclaimed by rebuilding both heaps from the window once
/// they outnumber the window width, so memory stays O(width) and every
/// operation O(log width) amortized.
#[derive(Debug, Clone)]
pub struct SlidingWindowMedian<T: Observation> {
    max_heap: BinaryHeap<T>,
    min_heap: BinaryHeap<Reverse<T>>,
    low_len: usize,
    high_len: usize,
    pending: HashMap<T, usize>,
    tombstones: usize,
    window: VecDeque<T>,
    width: NonZeroUsize,
}

impl<T: Observation> SlidingWindowMedian<T> {
    pub fn new(width: NonZeroUsize) -> Self {
        tracing::debug!(width = width.get(), "Created sliding window median");
        Self {
            max_heap: BinaryHeap::new(),
            min_heap: BinaryHeap::new(),
            low_len: 0,
            high_len: 0,
            pending: HashMap::new(),
            tombstones: 0,
            window: VecDeque::with_capacity(width.get() + 1),
            width,
        }
    }

    pub fn width(&self) -> NonZeroUsize {
        self.width
    }

    /// Live window contents, oldest first.
    pub fn window(&self) -> impl Iterator<Item = &T> + '_ {
        self.window.iter()
    }

    pub fn len(&self) -> usize {
        self.low_len + self.high_len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert(&mut self, value: T) {
        self.window.push_back(value);
        // Tops are purged after every operation, so this compares against a live value.
        match self.max_heap.peek() {
            Some(&lower_max) if value > lower_max => {
                self.min_heap.push(Reverse(value));
                self.high_len += 1;
            }
            _ => {
                self.max_heap.push(value);
                self.low_len += 1;
            }
        }
        halves::rebalance(self);
        tracing::trace!(?value, live = self.len(), "Inserted observation into window");

        if self.window.len() > self.width.get() {
            if let Some(expired) = self.window.pop_front() {
                self.retire(expired);
            }
        }
    }

    /// Median of the live window. Purges first in case a tombstone sits at a top.
    pub fn median(&mut self) -> Result<f64, MedianError> {
        self.purge();
        halves::median_from(
            self.low_len,
            self.high_len,
            self.max_heap.peek().copied(),
            self.min_heap.peek().map(|top| top.0),
        )
    }

    pub fn clear(&mut self) {
        self.max_heap.clear();
        self.min_heap.clear();
        self.pending.clear();
        self.tombstones = 0;
        self.window.clear();
        self.low_len = 0;
        self.high_len = 0;
    }

    pub fn check_invariants(&self) -> Result<(), MedianError> {
        if let Some(error) = halves::balance_violation(self.low_len, self.high_len) {
            return Err(error);
        }
        if self.max_heap.len() < self.low_len || self.min_heap.len() < self.high_len {
            return Err(MedianError::InvariantViolation(format!(
                "live counts (low: {}, high: {}) exceed physical sizes (low: {}, high: {})",
                self.low_len,
                self.high_len,
                self.max_heap.len(),
                self.min_heap.len()
            )));
        }
        let physical = self.max_heap.len() + self.min_heap.len();
        if physical - self.len() != self.tombstones {
            return Err(MedianError::InvariantViolation(format!(
                "{} pending removals do not account for {} dead entries",
                self.tombstones,
                physical - self.len()
            )));
        }
        if self.len() != self.window.len() {
            return Err(MedianError::InvariantViolation(format!(
                "{} live entries for a window of {}",
                self.len(),
                self.window.len()
            )));
        }
        let low_top = self.max_heap.peek().copied();
        let high_top = self.min_heap.peek().map(|top| top.0);
        if let Some(top) = low_top.into_iter().chain(high_top).find(|top| self.is_pending(top)) {
            return Err(MedianError::InvariantViolation(format!(
                "tombstoned value {top:?} left at a heap top"
            )));
        }
        match halves::order_violation(low_top, high_top) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /**
    Accounts for `expired` leaving the window.

    The half it belongs to is decided against the live lower top. An entry at or
    below it lives in the lower half, anything above it in the upper half.
    */
    fn retire(&mut self, expired: T) {
        let in_low = matches!(self.max_heap.peek(), Some(&lower_max) if expired <= lower_max);
        let live = if in_low { &mut self.low_len } else { &mut self.high_len };
        *live = live.checked_sub(1).unwrap_or_else(|| {
            halves::invariant_violation(format!(
                "retired {expired:?} but the {} half has no live entries",
                if in_low { "lower" } else { "upper" }
            ))
        });
        *self.pending.entry(expired).or_insert(0) += 1;
        self.tombstones += 1;
        tracing::trace!(?expired, in_low, "Retired observation");

        self.purge();
        halves::rebalance(self);
        if self.tombstones > self.len().max(self.width.get()) {
            self.compact();
        }

        if cfg!(debug_assertions) {
            if let Err(error) = self.check_invariants() {
                halves::invariant_violation(error.to_string());
            }
        }
    }

    /// Rebuilds both halves from the live window, dropping every tombstone.
    fn compact(&mut self) {
        let dropped = self.tombstones;
        let mut live: Vec<T> = self.window.iter().copied().collect();
        live.sort_unstable();
        let upper = live.split_off(live.len() - live.len() / 2);
        self.low_len = live.len();
        self.high_len = upper.len();
        self.max_heap = BinaryHeap::from(live);
        self.min_heap = upper.into_iter().map(Reverse).collect();
        self.pending.clear();
        self.tombstones = 0;
        tracing::debug!(dropped, live = self.len(), "Compacted sliding window");
    }

    /// Pops tombstoned tops until both tops are live or their heap is empty.
    fn purge(&mut self) {
        let mut purged = 0usize;
        loop {
            if let Some(&top) = self.max_heap.peek() {
                if self.take_pending(top) {
                    self.max_heap.pop();
                    purged += 1;
                    continue;
                }
            }
            if let Some(&Reverse(top)) = self.min_heap.peek() {
                if self.take_pending(top) {
                    self.min_heap.pop();
                    purged += 1;
                    continue;
                }
            }
            break;
        }
        if purged > 0 {
            tracing::trace!(purged, "Purged tombstoned entries");
        }
    }

    fn is_pending(&self, value: &T) -> bool {
        self.pending.get(value).is_some_and(|&count| count > 0)
    }

    /// Consumes one pending removal for `value`, if there is one.
    fn take_pending(&mut self, value: T) -> bool {
        match self.pending.get_mut(&value) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                self.pending.remove(&value);
            }
            None => return false,
        }
        self.tombstones -= 1;
        true
    }
}

impl<T: Observation> Halves for SlidingWindowMedian<T> {
    fn low_len(&self) -> usize {
        self.low_len
    }

    fn high_len(&self) -> usize {
        self.high_len
    }

    fn shift_low_to_high(&mut self) {
        if let Some(max_heap_top) = self.max_heap.pop() {
            self.min_heap.push(Reverse(max_heap_top));
            self.low_len -= 1;
            self.high_len += 1;
            self.purge();
        }
    }

    fn shift_high_to_low(&mut self) {
        if let Some(Reverse(min_heap_top)) = self.min_heap.pop() {
            self.max_heap.push(min_heap_top);
            self.high_len -= 1;
            self.low_len += 1;
            self.purge();
        }
    }
}

impl<T: Observation> StreamingMedian<T> for SlidingWindowMedian<T> {
    fn insert(&mut self, value: T) {
        SlidingWindowMedian::insert(self, value);
    }

    fn median(&mut self) -> Result<f64, MedianError> {
        SlidingWindowMedian::median(self)
    }

    fn len(&self) -> usize {
        SlidingWindowMedian::len(self)
    }

    fn check_invariants(&self) -> Result<(), MedianError> {
        SlidingWindowMedian::check_invariants(self)
    }
}

impl<T: Observation> Extend<T> for SlidingWindowMedian<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

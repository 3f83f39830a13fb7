use std::cmp::Reverse;
use std::collections::VecDeque;
use std::num::NonZeroUsize;

use crate::error::MedianError;
use crate::halves::{self, Halves};
use crate::indexed_heap::{IndexedHeap, Ticket};
use crate::observation::Observation;
use crate::StreamingMedian;

/// Median of at most `capacity` observations, evicting the oldest eagerly.
///
/// Unlike [`SlidingWindowMedian`](crate::SlidingWindowMedian) nothing is
/// tombstoned: the expired entry is removed from whichever half holds it
/// through the [`IndexedHeap`] ticket index, at O(log n) per eviction plus a
/// hash lookup. The halves therefore always contain exactly the live window.
#[derive(Debug, Clone)]
pub struct BoundedMedianFinder<T: Observation> {
    max_heap: IndexedHeap<T>,
    min_heap: IndexedHeap<Reverse<T>>,
    window: VecDeque<(Ticket, T)>,
    capacity: NonZeroUsize,
    next_ticket: Ticket,
}

impl<T: Observation> BoundedMedianFinder<T> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        tracing::debug!(capacity = capacity.get(), "Created bounded median finder");
        let half = capacity.get() / 2 + 1;
        Self {
            max_heap: IndexedHeap::with_capacity(half),
            min_heap: IndexedHeap::with_capacity(half),
            window: VecDeque::with_capacity(capacity.get()),
            capacity,
            next_ticket: 0,
        }
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    /// Live contents, oldest first.
    pub fn window(&self) -> impl Iterator<Item = &T> + '_ {
        self.window.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.max_heap.len() + self.min_heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.max_heap.is_empty()
    }

    pub fn insert(&mut self, value: T) {
        if self.window.len() == self.capacity.get() {
            if let Some((ticket, expired)) = self.window.pop_front() {
                self.evict(ticket, expired);
            }
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.window.push_back((ticket, value));
        match self.max_heap.peek() {
            Some(&lower_max) if value > lower_max => {
                self.min_heap.push(ticket, Reverse(value));
            }
            _ => {
                self.max_heap.push(ticket, value);
            }
        }
        halves::rebalance(self);
        tracing::trace!(
            ?value,
            ticket,
            live = self.len(),
            "Inserted observation into bounded finder"
        );
    }

    pub fn median(&self) -> Result<f64, MedianError> {
        halves::median_from(
            self.max_heap.len(),
            self.min_heap.len(),
            self.max_heap.peek().copied(),
            self.min_heap.peek().map(|top| top.0),
        )
    }

    pub fn clear(&mut self) {
        self.max_heap.clear();
        self.min_heap.clear();
        self.window.clear();
    }

    pub fn check_invariants(&self) -> Result<(), MedianError> {
        let (low_len, high_len) = (self.max_heap.len(), self.min_heap.len());
        if let Some(error) = halves::balance_violation(low_len, high_len) {
            return Err(error);
        }
        if self.len() != self.window.len() || self.len() > self.capacity.get() {
            return Err(MedianError::InvariantViolation(format!(
                "{} heap entries for a window of {} (capacity {})",
                self.len(),
                self.window.len(),
                self.capacity
            )));
        }
        if let Some((ticket, value)) = self
            .window
            .iter()
            .find(|(ticket, _)| {
                !self.max_heap.contains(*ticket) && !self.min_heap.contains(*ticket)
            })
        {
            return Err(MedianError::InvariantViolation(format!(
                "window entry {value:?} (ticket {ticket}) missing from both halves"
            )));
        }
        let low_top = self.max_heap.peek().copied();
        let high_top = self.min_heap.peek().map(|top| top.0);
        match halves::order_violation(low_top, high_top) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Removes the expired entry and rebalances before the next value is routed,
    /// so routing always compares against a valid lower top.
    fn evict(&mut self, ticket: Ticket, expired: T) {
        let removed =
            self.max_heap.remove(ticket).is_some() || self.min_heap.remove(ticket).is_some();
        if !removed {
            halves::invariant_violation(format!(
                "evicted {expired:?} (ticket {ticket}) is in neither half"
            ));
        }
        tracing::trace!(?expired, ticket, "Evicted observation");
        halves::rebalance(self);
    }
}

impl<T: Observation> Halves for BoundedMedianFinder<T> {
    fn low_len(&self) -> usize {
        self.max_heap.len()
    }

    fn high_len(&self) -> usize {
        self.min_heap.len()
    }

    fn shift_low_to_high(&mut self) {
        if let Some((ticket, max_heap_top)) = self.max_heap.pop() {
            self.min_heap.push(ticket, Reverse(max_heap_top));
        }
    }

    fn shift_high_to_low(&mut self) {
        if let Some((ticket, Reverse(min_heap_top))) = self.min_heap.pop() {
            self.max_heap.push(ticket, min_heap_top);
        }
    }
}

impl<T: Observation> StreamingMedian<T> for BoundedMedianFinder<T> {
    fn insert(&mut self, value: T) {
        BoundedMedianFinder::insert(self, value);
    }

    fn median(&mut self) -> Result<f64, MedianError> {
        BoundedMedianFinder::median(self)
    }

    fn len(&self) -> usize {
        BoundedMedianFinder::len(self)
    }

    fn check_invariants(&self) -> Result<(), MedianError> {
        BoundedMedianFinder::check_invariants(self)
    }
}

impl<T: Observation> Extend<T> for BoundedMedianFinder<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

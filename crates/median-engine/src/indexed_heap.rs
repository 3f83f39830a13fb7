//! Binary max-heap whose entries can be removed by ticket.
//!
//! `std::collections::BinaryHeap` only removes its top. The bounded median
//! finder has to drop an arbitrary expired entry, so every entry carries a
//! [`Ticket`] and the heap keeps a ticket -> slot index. Push, pop and remove
//! are all O(log n). Wrap keys in `Reverse` for min-heap order.

use std::collections::HashMap;

/// Identity of one inserted entry. Equal keys keep distinct tickets.
pub type Ticket = u64;

#[derive(Debug, Clone)]
pub struct IndexedHeap<K: Ord> {
    entries: Vec<(K, Ticket)>,
    slots: HashMap<Ticket, usize>,
}

impl<K: Ord> Default for IndexedHeap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord> IndexedHeap<K> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            slots: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            slots: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, ticket: Ticket) -> bool {
        self.slots.contains_key(&ticket)
    }

    pub fn peek(&self) -> Option<&K> {
        self.entries.first().map(|(key, _)| key)
    }

    /// Pushes `key` under `ticket`. Returns false, leaving the heap untouched,
    /// when the ticket is already present.
    pub fn push(&mut self, ticket: Ticket, key: K) -> bool {
        if self.slots.contains_key(&ticket) {
            return false;
        }
        let slot = self.entries.len();
        self.entries.push((key, ticket));
        self.slots.insert(ticket, slot);
        self.sift_up(slot);
        true
    }

    pub fn pop(&mut self) -> Option<(Ticket, K)> {
        if self.entries.is_empty() {
            return None;
        }
        self.take(0)
    }

    pub fn remove(&mut self, ticket: Ticket) -> Option<K> {
        let slot = *self.slots.get(&ticket)?;
        self.take(slot).map(|(_, key)| key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.slots.clear();
    }

    fn take(&mut self, slot: usize) -> Option<(Ticket, K)> {
        let last = self.entries.len().checked_sub(1)?;
        self.swap(slot, last);
        let (key, ticket) = self.entries.pop()?;
        self.slots.remove(&ticket);
        if slot < self.entries.len() {
            // The moved entry may belong either above or below its new slot.
            let slot = self.sift_up(slot);
            self.sift_down(slot);
        }
        Some((ticket, key))
    }

    fn sift_up(&mut self, mut slot: usize) -> usize {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.entries[slot].0 <= self.entries[parent].0 {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
        slot
    }

    fn sift_down(&mut self, mut slot: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * slot + 1;
            let right = left + 1;
            let mut largest = slot;
            if left < len && self.entries[left].0 > self.entries[largest].0 {
                largest = left;
            }
            if right < len && self.entries[right].0 > self.entries[largest].0 {
                largest = right;
            }
            if largest == slot {
                break;
            }
            self.swap(slot, largest);
            slot = largest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.entries.swap(a, b);
        self.slots.insert(self.entries[a].1, a);
        self.slots.insert(self.entries[b].1, b);
    }
}

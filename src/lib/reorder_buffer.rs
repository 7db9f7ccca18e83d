//! Reordering buffer for out-of-order task completion.
//!
//! Worker pool tasks finish in whatever order the scheduler produces. The buffer accepts
//! results tagged with their submission index and hands them back in submission order.
//!
//! # Example
//!
//! ```
//! use fqtrim_lib::reorder_buffer::ReorderBuffer;
//!
//! let mut buffer: ReorderBuffer<&str> = ReorderBuffer::new();
//! buffer.insert(2, "third");
//! buffer.insert(0, "first");
//! assert_eq!(buffer.drain_ready(), vec!["first"]);
//! buffer.insert(1, "second");
//! assert_eq!(buffer.drain_ready(), vec!["second", "third"]);
//! ```

use std::collections::VecDeque;

/// A buffer that releases items in index order.
///
/// Slot `i` of the internal deque holds the item with index `next + i`.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    pending: VecDeque<Option<T>>,
    next: usize,
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReorderBuffer<T> {
    /// Creates an empty buffer expecting index 0 first.
    #[must_use]
    pub fn new() -> Self {
        Self { pending: VecDeque::new(), next: 0 }
    }

    /// Stores `item` under `index`.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `index` was already released or is already buffered.
    pub fn insert(&mut self, index: usize, item: T) {
        debug_assert!(index >= self.next, "Index {index} was already released");
        let offset = index - self.next;
        if self.pending.len() <= offset {
            self.pending.resize_with(offset + 1, || None);
        }
        debug_assert!(self.pending[offset].is_none(), "Duplicate index: {index}");
        self.pending[offset] = Some(item);
    }

    /// Pops the item with the next index, if it has arrived.
    pub fn try_pop_next(&mut self) -> Option<T> {
        match self.pending.front() {
            Some(Some(_)) => {
                let item = self.pending.pop_front().flatten();
                self.next += 1;
                item
            }
            _ => None,
        }
    }

    /// Pops every item that is ready, in order.
    pub fn drain_ready(&mut self) -> Vec<T> {
        std::iter::from_fn(|| self.try_pop_next()).collect()
    }

    /// Index of the next item to be released.
    #[cfg(test)]
    fn next_index(&self) -> usize {
        self.next
    }

    /// Number of items held back waiting for an earlier index.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.pending.iter().filter(|slot| slot.is_some()).count()
    }

    /// True when nothing is buffered.
    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

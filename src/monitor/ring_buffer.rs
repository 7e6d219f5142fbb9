//! Fixed-capacity sample history backing one sparkline.

#![allow(missing_docs)]

/// Circular store of the most recent samples.
///
/// `head` is the next write slot, so `data[(head + cap - 1) % cap]` is the
/// newest sample once anything has been pushed. Capacity 0 means inactive:
/// pushes are dropped and snapshots are empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RingBuffer {
    data: Vec<f64>,
    head: usize,
}

impl RingBuffer {
    /// Inactive buffer (capacity 0).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut buffer = Self::new();
        buffer.init(capacity);
        buffer
    }

    /// Reallocate to `capacity` zero-filled slots and rewind `head`.
    ///
    /// Prior history is discarded.
    pub fn init(&mut self, capacity: usize) {
        self.data = vec![0.0; capacity];
        self.head = 0;
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.data.is_empty()
    }

    /// Overwrite the oldest slot with `value`.
    pub fn push(&mut self, value: f64) {
        if self.data.is_empty() {
            return;
        }
        self.data[self.head] = value;
        self.head = (self.head + 1) % self.data.len();
    }

    /// Slot written by the most recent push (a zero fill value before any push).
    #[must_use]
    pub fn latest(&self) -> Option<f64> {
        let capacity = self.data.len();
        if capacity == 0 {
            return None;
        }
        Some(self.data[(self.head + capacity - 1) % capacity])
    }

    /// Samples oldest to newest; item `i` is drawn in column `i`.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = f64> + '_ {
        let capacity = self.data.len();
        (0..capacity).map(move |i| self.data[(self.head + i) % capacity])
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<f64> {
        self.iter().collect()
    }
}

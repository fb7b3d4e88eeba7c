// Fixed-capacity sample ring; overwrites the oldest slot once full.

/// Default capacity: one hour of history at one sample per second.
pub const DEFAULT_RING_CAPACITY: usize = 3600;

/// Sentinel stored for a dropped or lost sample. Never zero.
pub const LOST: f64 = f64::NAN;

/// Bounded numeric buffer backing every rolling series in the stores.
///
/// Capacity is fixed at construction. `push` is O(1) and never fails;
/// `to_chronological` materializes an owned copy ordered oldest to newest.
#[derive(Debug, Clone)]
pub struct SampleRing {
    data: Box<[f64]>,
    head: usize,
    len: usize,
}

impl Default for SampleRing {
    fn default() -> Self {
        Self::new(DEFAULT_RING_CAPACITY)
    }
}

impl SampleRing {
    /// A zero capacity is bumped to 1 so `push` stays infallible.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: vec![LOST; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    /// Ring of `len` lost samples (clamped to capacity), used to align a late-starting series.
    pub fn with_lost_prefix(capacity: usize, len: usize) -> Self {
        let mut ring = Self::new(capacity);
        for _ in 0..len.min(ring.capacity()) {
            ring.push(LOST);
        }
        ring
    }

    pub fn push(&mut self, value: f64) {
        let capacity = self.data.len();
        self.data[self.head] = value;
        self.head = (self.head + 1) % capacity;
        if self.len < capacity {
            self.len += 1;
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Most recently pushed value.
    pub fn last(&self) -> Option<f64> {
        if self.len == 0 {
            return None;
        }
        let capacity = self.data.len();
        Some(self.data[(self.head + capacity - 1) % capacity])
    }

    pub fn to_chronological(&self) -> Vec<f64> {
        let capacity = self.data.len();
        let start = (self.head + capacity - self.len) % capacity;
        let mut out = Vec::with_capacity(self.len);
        for i in 0..self.len {
            out.push(self.data[(start + i) % capacity]);
        }
        out
    }

    /// Chronological copy with every sample mapped through `f` (unit conversion at read time).
    pub fn map_chronological(&self, f: impl Fn(f64) -> f64) -> Vec<f64> {
        let mut out = self.to_chronological();
        for v in &mut out {
            *v = f(*v);
        }
        out
    }
}

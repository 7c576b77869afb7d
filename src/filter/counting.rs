use super::{BitVectorFilter, BloomFilterOps, BloomFilterStats, FilterParams};
use crate::hash::HashFunction;

/// Bit vector filter that keeps track of how many elements went in and
/// reports when it reached the size it was designed for.
#[derive(Debug)]
pub struct CountingFilter {
    inner: BitVectorFilter,
    inserted: usize,
    capacity: usize,
}

impl CountingFilter {
    pub fn new(params: FilterParams, hash_function: HashFunction) -> Self {
        Self {
            inner: BitVectorFilter::new(params, hash_function),
            inserted: 0,
            capacity: params.capacity(),
        }
    }

    pub fn size(&self) -> usize {
        self.inserted
    }

    pub fn is_full(&self) -> bool {
        self.inserted >= self.capacity
    }

    pub fn positions(&self, key: &[u8]) -> Vec<u32> {
        self.inner.positions(key)
    }

    pub fn count_ones(&self) -> usize {
        self.inner.count_ones()
    }
}

impl BloomFilterOps for CountingFilter {
    fn add(&mut self, key: &[u8]) {
        self.inserted = self.inserted.saturating_add(1);
        self.inner.add(key);
    }

    fn include(&self, key: &[u8]) -> bool {
        self.inner.include(key)
    }

    fn include_positions(&self, positions: &[u32]) -> bool {
        self.inner.include_positions(positions)
    }

    fn clear(&mut self) {
        self.inserted = 0;
        self.inner.clear();
    }
}

impl BloomFilterStats for CountingFilter {
    fn params(&self) -> FilterParams {
        self.inner.params()
    }

    fn insert_count(&self) -> usize {
        self.inserted
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

use super::{
    BloomFilterOps, BloomFilterStats, CountingFilter, FilterConfig, FilterParams,
};
use crate::error::Result;
use crate::hash::{HashFunction, default_hash_function, positions};
use tracing::debug;

/// Bloom filter that grows without bound by chaining fixed size filters.
///
/// New elements always go to the most recent filter. Once it reports full a
/// fresh filter with the same `(m, k)` is appended; lookups check every
/// filter in the chain.
#[derive(Debug)]
pub struct ScalableFilter {
    params: FilterParams,
    hash_function: HashFunction,
    // Full filters, oldest first
    sealed: Vec<CountingFilter>,
    // The one accepting inserts; the chain is never empty
    active: CountingFilter,
}

impl ScalableFilter {
    pub fn new(params: FilterParams, hash_function: HashFunction) -> Self {
        Self {
            params,
            hash_function,
            sealed: Vec::new(),
            active: CountingFilter::new(params, hash_function),
        }
    }

    pub fn from_config(config: FilterConfig) -> Result<Self> {
        let params = config.resolve_params()?;
        Ok(Self::new(params, config.hash_function))
    }

    pub fn with_capacity(capacity: usize, false_positive_rate: f64) -> Result<Self> {
        let params = FilterParams::from_capacity(capacity, false_positive_rate)?;
        Ok(Self::new(params, default_hash_function))
    }

    /// Total number of elements added across the whole chain
    pub fn size(&self) -> usize {
        self.sealed.iter().map(CountingFilter::size).sum::<usize>()
            + self.active.size()
    }

    /// Number of chained filters, at least one
    pub fn filter_count(&self) -> usize {
        self.sealed.len() + 1
    }

    /// Chained filters in insertion order
    pub fn filters(&self) -> impl Iterator<Item = &CountingFilter> {
        self.sealed.iter().chain(std::iter::once(&self.active))
    }

    pub fn positions(&self, key: &[u8]) -> Vec<u32> {
        positions(
            key,
            self.params.num_hashes(),
            self.params.bit_vector_size(),
            self.hash_function,
        )
    }

    fn grow(&mut self) {
        let full = std::mem::replace(
            &mut self.active,
            CountingFilter::new(self.params, self.hash_function),
        );
        self.sealed.push(full);
        debug!(
            filters = self.filter_count(),
            size = self.size(),
            "scalable filter grew"
        );
    }
}

impl BloomFilterOps for ScalableFilter {
    fn add(&mut self, key: &[u8]) {
        self.active.add(key);
        if self.active.is_full() {
            self.grow();
        }
    }

    fn include(&self, key: &[u8]) -> bool {
        if self.sealed.is_empty() {
            return self.active.include(key);
        }
        // Hash once for the whole chain
        let positions = self.positions(key);
        self.include_positions(&positions)
    }

    fn include_positions(&self, positions: &[u32]) -> bool {
        self.filters()
            .any(|filter| filter.include_positions(positions))
    }

    /// Keeps the first filter of the chain and reuses it instead of
    /// allocating a new one.
    fn clear(&mut self) {
        if let Some(first) = self.sealed.drain(..).next() {
            self.active = first;
        }
        self.active.clear();
    }
}

impl BloomFilterStats for ScalableFilter {
    fn params(&self) -> FilterParams {
        self.params
    }

    fn insert_count(&self) -> usize {
        self.size()
    }

    /// Capacity of the chain as it stands; grows with every appended filter
    fn capacity(&self) -> usize {
        self.params.capacity() * self.filter_count()
    }
}

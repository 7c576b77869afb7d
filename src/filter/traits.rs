use super::FilterParams;

/// Core operations shared by the bit vector filters.
///
/// Implementors are used through generics, never as trait objects.
pub trait BloomFilterOps {
    /// Sets every position derived from `key`
    fn add(&mut self, key: &[u8]);

    /// True if every position derived from `key` is set
    fn include(&self, key: &[u8]) -> bool;

    /// Same as `include`, for positions already derived by the caller
    fn include_positions(&self, positions: &[u32]) -> bool;

    /// Resets the filter to its freshly created state
    fn clear(&mut self);

    /// Adds an integer key as its fixed width big endian encoding
    fn add_u64(&mut self, key: u64) {
        self.add(&key.to_be_bytes());
    }

    fn include_u64(&self, key: u64) -> bool {
        self.include(&key.to_be_bytes())
    }
}

pub trait BloomFilterStats {
    fn params(&self) -> FilterParams;
    /// Number of `add` calls since creation or the last clear
    fn insert_count(&self) -> usize;
    /// Number of elements the filter was sized for
    fn capacity(&self) -> usize;
}

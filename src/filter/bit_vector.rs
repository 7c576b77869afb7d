use super::{BloomFilterOps, FilterConfig, FilterParams};
use crate::error::Result;
use crate::hash::{HashFunction, default_hash_function, positions};
use bitvec::{bitvec, order::Lsb0, vec::BitVec};

/// Plain Bloom filter over a fixed size bit vector.
pub struct BitVectorFilter {
    params: FilterParams,
    hash_function: HashFunction,
    bits: BitVec<usize, Lsb0>,
}

impl BitVectorFilter {
    pub fn new(params: FilterParams, hash_function: HashFunction) -> Self {
        Self {
            params,
            hash_function,
            bits: bitvec![0; params.bit_vector_size()],
        }
    }

    pub fn from_config(config: FilterConfig) -> Result<Self> {
        let params = config.resolve_params()?;
        Ok(Self::new(params, config.hash_function))
    }

    /// Sized for `capacity` elements at `false_positive_rate`, default hash.
    pub fn with_capacity(capacity: usize, false_positive_rate: f64) -> Result<Self> {
        let params = FilterParams::from_capacity(capacity, false_positive_rate)?;
        Ok(Self::new(params, default_hash_function))
    }

    pub fn params(&self) -> FilterParams {
        self.params
    }

    pub fn hash_function(&self) -> HashFunction {
        self.hash_function
    }

    /// Bit positions `key` maps to in this filter
    pub fn positions(&self, key: &[u8]) -> Vec<u32> {
        positions(
            key,
            self.params.num_hashes(),
            self.params.bit_vector_size(),
            self.hash_function,
        )
    }

    /// Number of set bits
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }
}

impl BloomFilterOps for BitVectorFilter {
    fn add(&mut self, key: &[u8]) {
        for idx in self.positions(key) {
            self.bits.set(idx as usize, true);
        }
    }

    fn include(&self, key: &[u8]) -> bool {
        self.include_positions(&self.positions(key))
    }

    fn include_positions(&self, positions: &[u32]) -> bool {
        // Positions from a differently sized filter read as unset
        positions
            .iter()
            .all(|&idx| self.bits.get(idx as usize).is_some_and(|bit| *bit))
    }

    fn clear(&mut self) {
        self.bits.fill(false);
    }
}

impl std::fmt::Debug for BitVectorFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BitVectorFilter {{ bit_vector_size: {}, num_hashes: {}, ones: {} }}",
            self.params.bit_vector_size(),
            self.params.num_hashes(),
            self.count_ones()
        )
    }
}

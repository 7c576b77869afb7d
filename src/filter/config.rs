use crate::error::{FilterError, Result};
use crate::hash::{
    HashFunction, MAX_BIT_VECTOR_SIZE, default_hash_function,
    optimal_bit_vector_size, optimal_num_hashes,
};
use derive_builder::Builder;
use serde::Serialize;

/// Validated bit vector size (`m`) and number of positions per key (`k`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterParams {
    bit_vector_size: usize,
    num_hashes: usize,
}

impl FilterParams {
    /// Explicit `m` and `k`. Requires `0 < k <= m <= MAX_BIT_VECTOR_SIZE`.
    pub fn new(bit_vector_size: usize, num_hashes: usize) -> Result<Self> {
        if bit_vector_size == 0 {
            return Err(FilterError::InvalidParameter(
                "Bit vector size must be > 0".into(),
            ));
        }
        if bit_vector_size > MAX_BIT_VECTOR_SIZE {
            return Err(FilterError::Overflow {
                requested: bit_vector_size as f64,
                max: MAX_BIT_VECTOR_SIZE,
            });
        }
        if num_hashes == 0 {
            return Err(FilterError::InvalidParameter(
                "Number of hashes must be > 0".into(),
            ));
        }
        if num_hashes > bit_vector_size {
            return Err(FilterError::InvalidParameter(format!(
                "Number of hashes ({num_hashes}) must not exceed bit vector size ({bit_vector_size})"
            )));
        }
        Ok(Self {
            bit_vector_size,
            num_hashes,
        })
    }

    /// Derives `m` and `k` from the expected number of elements and the
    /// target false positive probability.
    pub fn from_capacity(capacity: usize, false_positive_rate: f64) -> Result<Self> {
        if capacity == 0 {
            return Err(FilterError::InvalidParameter(
                "Capacity must be > 0".into(),
            ));
        }
        validate_false_positive_rate(false_positive_rate)?;

        let bit_vector_size =
            optimal_bit_vector_size(capacity, false_positive_rate)?;
        let num_hashes = optimal_num_hashes(capacity, bit_vector_size);
        Self::new(bit_vector_size, num_hashes)
    }

    pub fn bit_vector_size(&self) -> usize {
        self.bit_vector_size
    }

    pub fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    /// Number of elements a single bit vector holds before it counts as full:
    /// `floor(m * ln 2 / k)`, at least one.
    pub fn capacity(&self) -> usize {
        let n = (self.bit_vector_size as f64 * std::f64::consts::LN_2
            / self.num_hashes as f64)
            .floor() as usize;
        n.max(1)
    }
}

pub(crate) fn validate_false_positive_rate(rate: f64) -> Result<()> {
    if !(rate > 0.0 && rate < 1.0) {
        return Err(FilterError::InvalidParameter(format!(
            "False positive rate must be between 0 and 1, got {rate}"
        )));
    }
    Ok(())
}

/// Configuration for the non-aging filters
#[derive(Clone, Debug, Builder)]
#[builder(pattern = "owned")]
pub struct FilterConfig {
    /// Expected number of elements
    #[builder(default = "1_000")]
    pub capacity: usize,

    /// Desired false positive rate (between 0 and 1)
    #[builder(default = "0.01")]
    pub false_positive_rate: f64,

    /// Explicit bit vector size and hash count, takes precedence over
    /// `capacity` and `false_positive_rate`
    #[builder(default, setter(strip_option))]
    pub params: Option<FilterParams>,

    /// Hash function used to derive bit positions
    #[builder(default = "default_hash_function")]
    pub hash_function: HashFunction,
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        self.resolve_params().map(|_| ())
    }

    pub fn resolve_params(&self) -> Result<FilterParams> {
        match self.params {
            Some(params) => Ok(params),
            None => {
                FilterParams::from_capacity(self.capacity, self.false_positive_rate)
            }
        }
    }
}

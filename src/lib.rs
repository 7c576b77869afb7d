//! Bloom filters with and without expiration.
//!
//! The crate provides plain bit vector filters, a scalable filter that grows a
//! chain of sub-filters as it fills up, and two aging filters that forget keys
//! after a time to live.
//!
//! HowTo:
//!    * Hashing: every key is hashed once with seed 42. The 64 bit result is
//!      split into halves `a` and `b`, position `i` is `(a + b * i) mod m`.
//!    * Sizing: `m` and `k` are derived from the expected element count `n` and
//!      the target false positive rate `p`. A sub-filter counts as full after
//!      `floor(m * ln2 / k)` inserts.
//!
//! Scalable filter:
//!     * Inserts go to the newest sub-filter. When it is full a fresh one with
//!       the same parameters is appended.
//!     * A lookup hits if any sub-filter contains the key.
//!
//! Dual buffer aging filter (A2):
//!     * Two scalable filters, one active. Inserts go to the active one, lookups
//!       read both.
//!     * Every TTL the inactive buffer is cleared and becomes active, so a key
//!       lives between one and two TTLs.
//!
//! Bucket timestamp aging filter:
//!     * Each position stores the epoch it was last written in, zero meaning
//!       never written.
//!     * The epoch advances once per period and wraps around. A position is
//!       set while its stamp is at most `ttl` epochs old, plus one grace
//!       epoch on the modulo 8 ring.
//!     * Stamps a full ring old are reclaimed before their value is reused.
//!
//! Known limits:
//!     * Bit vectors are addressed with 32 bit positions, so `m` can not exceed
//!       `u32::MAX`.
//!     * Aging filters only expire keys while their background worker runs (or
//!       when `Tick::tick` is called directly).

pub mod aging;
mod error;
pub mod filter;
mod hash;

pub use aging::{
    AgingFilterConfig, AgingFilterConfigBuilder, AgingFilterConfigBuilderError,
    AgingFilterOps, BucketTimestampFilter, DualBufferAgingFilter, EpochRing,
    ManualTickHandle, ManualTicker, SleepTicker, Tick, Ticker,
    TimestampFilterConfig, TimestampFilterConfigBuilder, WorkerStats,
};
pub use error::{FilterError, Result};
pub use filter::{
    BitVectorFilter, BloomFilterOps, BloomFilterStats, CountingFilter,
    FilterConfig, FilterConfigBuilder, FilterConfigBuilderError, FilterParams,
    ScalableFilter,
};
pub use hash::{
    HASH_SEED, HashFunction, MAX_BIT_VECTOR_SIZE, default_hash_function,
    fnv_hash64, optimal_bit_vector_size, optimal_num_hashes, positions,
};

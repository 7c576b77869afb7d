//! Bit vector Bloom filters: plain, size tracking and scalable
pub mod bit_vector;
pub mod config;
pub mod counting;
pub mod scalable;
pub mod traits;

pub use bit_vector::BitVectorFilter;
pub use config::{
    FilterConfig, FilterConfigBuilder, FilterConfigBuilderError, FilterParams,
};
pub use counting::CountingFilter;
pub use scalable::ScalableFilter;
pub use traits::{BloomFilterOps, BloomFilterStats};

//! Filters that forget keys after a time to live
//!
//! Two strategies are provided. [`DualBufferAgingFilter`] rotates a pair of
//! scalable filters once per TTL. [`BucketTimestampFilter`] keeps an epoch
//! stamp per position and treats old stamps as unset. Both are driven by an
//! [`AgingWorker`] thread whose timing comes from a [`Ticker`].
pub mod config;
pub mod dual_buffer;
pub mod ticker;
pub mod timestamp;
pub mod traits;
pub mod worker;

pub use config::{
    AgingFilterConfig, AgingFilterConfigBuilder, AgingFilterConfigBuilderError,
    EpochRing, TimestampFilterConfig, TimestampFilterConfigBuilder,
    TimestampFilterConfigBuilderError,
};
pub use dual_buffer::{DualBufferAgingFilter, DualBufferStats};
pub use ticker::{ManualTickHandle, ManualTicker, SleepTicker, Ticker};
pub use timestamp::{BucketTimestampFilter, TimestampStats};
pub use traits::{AgingFilterOps, Tick};
pub use worker::{AgingWorker, StopToken, WorkerStats};

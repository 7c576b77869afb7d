use super::worker::WorkerSlot;
use super::{AgingFilterConfig, AgingFilterOps, Tick, Ticker, WorkerStats};
use crate::error::{FilterError, Result};
use crate::filter::{BloomFilterOps, FilterParams, ScalableFilter};
use crate::hash::{HashFunction, positions};
use serde::Serialize;
use std::sync::{
    Arc, RwLock, RwLockReadGuard, RwLockWriteGuard,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;
use tracing::debug;

/// Point in time view of a [`DualBufferAgingFilter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DualBufferStats {
    pub active_buffer: usize,
    /// Elements added to each buffer since its last clear
    pub inserted: [usize; 2],
    /// Chained sub-filters in each buffer
    pub filter_counts: [usize; 2],
    pub ttl: Duration,
}

/// Aging Bloom filter built from two scalable filters ("A2").
///
/// Inserts go to the active buffer, lookups read both. Every TTL the
/// inactive buffer is cleared and becomes active, so an element stays
/// visible for at least one TTL and at most two.
pub struct DualBufferAgingFilter {
    params: FilterParams,
    hash_function: HashFunction,
    ttl: Duration,
    buffers: [RwLock<ScalableFilter>; 2],
    active: AtomicUsize,
    worker: WorkerSlot,
}

impl DualBufferAgingFilter {
    pub fn new(config: AgingFilterConfig) -> Result<Self> {
        config.validate()?;
        let params = config.resolve_params()?;
        let hash_function = config.hash_function;

        Ok(Self {
            params,
            hash_function,
            ttl: config.ttl,
            buffers: [
                RwLock::new(ScalableFilter::new(params, hash_function)),
                RwLock::new(ScalableFilter::new(params, hash_function)),
            ],
            active: AtomicUsize::new(0),
            worker: WorkerSlot::default(),
        })
    }

    pub fn params(&self) -> FilterParams {
        self.params
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Index of the buffer receiving inserts
    pub fn active_buffer(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Elements added across both buffers since they were last cleared
    pub fn size(&self) -> Result<usize> {
        Ok(self.read(0)?.size() + self.read(1)?.size())
    }

    pub fn stats(&self) -> Result<DualBufferStats> {
        let first = self.read(0)?;
        let second = self.read(1)?;
        Ok(DualBufferStats {
            active_buffer: self.active_buffer(),
            inserted: [first.size(), second.size()],
            filter_counts: [first.filter_count(), second.filter_count()],
            ttl: self.ttl,
        })
    }

    /// Starts the background worker rotating the buffers every TTL.
    pub fn start<T: Ticker>(self: &Arc<Self>, ticker: T) -> Result<()> {
        self.worker
            .start("dual-buffer-aging", self, self.ttl, ticker)
    }

    /// Stops the background worker; blocks until its pending wait ends.
    pub fn stop(&self) -> Result<Option<WorkerStats>> {
        self.worker.stop()
    }

    pub fn worker_stats(&self) -> Result<Option<WorkerStats>> {
        self.worker.stats()
    }

    fn read(&self, index: usize) -> Result<RwLockReadGuard<'_, ScalableFilter>> {
        self.buffers[index].read().map_err(|_| {
            FilterError::LockError(format!("Failed to read buffer {index}"))
        })
    }

    fn write(&self, index: usize) -> Result<RwLockWriteGuard<'_, ScalableFilter>> {
        self.buffers[index].write().map_err(|_| {
            FilterError::LockError(format!("Failed to write buffer {index}"))
        })
    }
}

impl AgingFilterOps for DualBufferAgingFilter {
    fn add(&self, key: &[u8]) -> Result<()> {
        let active = self.active.load(Ordering::Acquire);
        self.write(active)?.add(key);
        Ok(())
    }

    fn include(&self, key: &[u8]) -> Result<bool> {
        // Hash once, check both buffers
        let positions = positions(
            key,
            self.params.num_hashes(),
            self.params.bit_vector_size(),
            self.hash_function,
        );
        Ok(self.read(0)?.include_positions(&positions)
            || self.read(1)?.include_positions(&positions))
    }
}

impl Tick for DualBufferAgingFilter {
    /// Clears the inactive buffer, then makes it the active one. The clear
    /// completes before the new index is published, so no insert can land
    /// in a buffer that is being cleared.
    fn tick(&self) -> Result<()> {
        let current = self.active.load(Ordering::Acquire);
        let next = (current + 1) % 2;

        self.write(next)?.clear();
        self.active.store(next, Ordering::Release);

        debug!(from = current, to = next, "rotated aging buffers");
        Ok(())
    }
}

impl std::fmt::Debug for DualBufferAgingFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DualBufferAgingFilter {{ bit_vector_size: {}, num_hashes: {}, ttl: {:?}, active: {} }}",
            self.params.bit_vector_size(),
            self.params.num_hashes(),
            self.ttl,
            self.active_buffer()
        )
    }
}

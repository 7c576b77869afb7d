use super::worker::WorkerSlot;
use super::{
    AgingFilterOps, EpochRing, Tick, Ticker, TimestampFilterConfig, WorkerStats,
};
use crate::error::Result;
use crate::filter::FilterParams;
use crate::hash::{HashFunction, positions};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimestampStats {
    pub current_epoch: u8,
    pub ttl_epochs: u8,
    pub ring: EpochRing,
    /// Positions holding a stamp, live or not yet reclaimed
    pub stamped_positions: usize,
}

/// Aging Bloom filter storing the epoch of the last write per position.
///
/// A position counts as set while its stamp is at most `ttl_epochs` epochs
/// old, plus the grace epochs of its [`EpochRing`]. Stamps cycle through `1..wrap`, zero marks a position that was never
/// written or has been reclaimed.
pub struct BucketTimestampFilter {
    params: FilterParams,
    hash_function: HashFunction,
    ring: EpochRing,
    ttl_epochs: u8,
    epoch_duration: Duration,
    stamps: Box<[AtomicU8]>,
    epoch: AtomicU8,
    worker: WorkerSlot,
}

impl BucketTimestampFilter {
    pub fn new(config: TimestampFilterConfig) -> Result<Self> {
        config.validate()?;
        let params = config.resolve_params()?;
        let stamps = (0..params.bit_vector_size())
            .map(|_| AtomicU8::new(0))
            .collect();

        Ok(Self {
            params,
            hash_function: config.hash_function,
            ring: config.ring,
            ttl_epochs: config.ttl_epochs,
            epoch_duration: config.epoch_duration,
            stamps,
            epoch: AtomicU8::new(1),
            worker: WorkerSlot::default(),
        })
    }

    pub fn params(&self) -> FilterParams {
        self.params
    }

    pub fn ring(&self) -> EpochRing {
        self.ring
    }

    pub fn current_epoch(&self) -> u8 {
        self.epoch.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> TimestampStats {
        TimestampStats {
            current_epoch: self.current_epoch(),
            ttl_epochs: self.ttl_epochs,
            ring: self.ring,
            stamped_positions: self
                .stamps
                .iter()
                .filter(|stamp| stamp.load(Ordering::Relaxed) != 0)
                .count(),
        }
    }

    /// Starts the background worker advancing the epoch once per
    /// `epoch_duration`.
    pub fn start<T: Ticker>(self: &Arc<Self>, ticker: T) -> Result<()> {
        self.worker
            .start("timestamp-aging", self, self.epoch_duration, ticker)
    }

    pub fn stop(&self) -> Result<Option<WorkerStats>> {
        self.worker.stop()
    }

    pub fn worker_stats(&self) -> Result<Option<WorkerStats>> {
        self.worker.stats()
    }

    fn positions(&self, key: &[u8]) -> Vec<u32> {
        positions(
            key,
            self.params.num_hashes(),
            self.params.bit_vector_size(),
            self.hash_function,
        )
    }
}

impl AgingFilterOps for BucketTimestampFilter {
    fn add(&self, key: &[u8]) -> Result<()> {
        let epoch = self.epoch.load(Ordering::Acquire);
        for idx in self.positions(key) {
            self.stamps[idx as usize].store(epoch, Ordering::Release);
        }
        Ok(())
    }

    /// Every derived position is checked; expired ones are reset to zero on
    /// the way so their slot reads as never written.
    fn include(&self, key: &[u8]) -> Result<bool> {
        let epoch = self.epoch.load(Ordering::Acquire);
        let mut live = true;

        for idx in self.positions(key) {
            let slot = &self.stamps[idx as usize];
            let stamp = slot.load(Ordering::Acquire);
            if self.ring.is_live(stamp, epoch, self.ttl_epochs) {
                continue;
            }
            // A writer may have stamped an epoch published after our load
            let now = self.epoch.load(Ordering::Acquire);
            if now != epoch && self.ring.is_live(stamp, now, self.ttl_epochs) {
                continue;
            }
            live = false;
            if stamp != 0 {
                // A concurrent add may have restamped it already
                let _ = slot.compare_exchange(
                    stamp,
                    0,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                );
            }
        }
        Ok(live)
    }
}

impl Tick for BucketTimestampFilter {
    /// Advances the epoch. Stamps carrying the value about to be reused are
    /// a full ring old; they are reclaimed before the new epoch is published
    /// so they can not pass for fresh writes.
    fn tick(&self) -> Result<()> {
        let current = self.epoch.load(Ordering::Acquire);
        let next = self.ring.next(current);

        let mut reclaimed = 0usize;
        for slot in self.stamps.iter() {
            if slot
                .compare_exchange(next, 0, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                reclaimed += 1;
            }
        }
        self.epoch.store(next, Ordering::Release);

        debug!(from = current, to = next, reclaimed, "advanced epoch");
        Ok(())
    }
}

impl std::fmt::Debug for BucketTimestampFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BucketTimestampFilter {{ bit_vector_size: {}, num_hashes: {}, ttl_epochs: {}, wrap: {}, epoch: {} }}",
            self.params.bit_vector_size(),
            self.params.num_hashes(),
            self.ttl_epochs,
            self.ring.wrap(),
            self.current_epoch()
        )
    }
}

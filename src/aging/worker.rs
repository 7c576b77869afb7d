use super::{Tick, Ticker};
use crate::error::{FilterError, Result};
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{
    Arc, Mutex, Weak,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Cooperative cancellation flag owned by one aging worker.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Snapshot of a worker's health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    /// Ticks applied successfully
    pub ticks: u64,
    /// Ticks that returned an error or panicked
    pub failed_ticks: u64,
    pub running: bool,
}

#[derive(Debug, Default)]
struct WorkerCounters {
    ticks: AtomicU64,
    failed_ticks: AtomicU64,
    running: AtomicBool,
}

/// Background thread applying `Tick::tick` once per period.
///
/// The worker only holds a weak reference to its filter, so dropping the
/// last strong reference ends the loop at the next tick.
#[derive(Debug)]
pub struct AgingWorker {
    name: String,
    stop: StopToken,
    counters: Arc<WorkerCounters>,
    handle: Option<JoinHandle<()>>,
}

impl AgingWorker {
    pub fn spawn<F, T>(
        name: &str,
        filter: Weak<F>,
        period: Duration,
        ticker: T,
    ) -> Result<Self>
    where
        F: Tick,
        T: Ticker,
    {
        let stop = StopToken::new();
        let counters = Arc::new(WorkerCounters::default());
        counters.running.store(true, Ordering::Release);

        let handle = {
            let stop = stop.clone();
            let counters = Arc::clone(&counters);
            thread::Builder::new()
                .name(name.to_string())
                .spawn(move || run(filter, period, ticker, stop, counters))
                .map_err(|e| FilterError::WorkerSpawn(e.to_string()))?
        };

        info!(worker = name, ?period, "aging worker started");
        Ok(Self {
            name: name.to_string(),
            stop,
            counters,
            handle: Some(handle),
        })
    }

    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    pub fn is_running(&self) -> bool {
        self.counters.running.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> WorkerStats {
        WorkerStats {
            ticks: self.counters.ticks.load(Ordering::Relaxed),
            failed_ticks: self.counters.failed_ticks.load(Ordering::Relaxed),
            running: self.is_running(),
        }
    }

    /// Signals the worker and waits for it to exit. The worker notices the
    /// signal only after its current wait returns, so this can block for up
    /// to one period.
    pub fn stop(mut self) -> Result<WorkerStats> {
        self.stop.cancel();
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| FilterError::WorkerPanicked(self.name.clone()))?;
        }
        Ok(self.stats())
    }
}

impl Drop for AgingWorker {
    fn drop(&mut self) {
        // Never join here, the last filter reference may live on the worker
        self.stop.cancel();
    }
}

fn run<F, T>(
    filter: Weak<F>,
    period: Duration,
    mut ticker: T,
    stop: StopToken,
    counters: Arc<WorkerCounters>,
) where
    F: Tick,
    T: Ticker,
{
    while !stop.is_cancelled() {
        if !ticker.wait(period) {
            debug!("ticker closed");
            break;
        }
        if stop.is_cancelled() {
            break;
        }
        let Some(filter) = filter.upgrade() else {
            debug!("filter dropped, aging worker exiting");
            break;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| filter.tick())) {
            Ok(Ok(())) => {
                counters.ticks.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(err)) => {
                counters.failed_ticks.fetch_add(1, Ordering::Relaxed);
                error!("Aging tick failed: {}", err);
            }
            Err(_) => {
                counters.failed_ticks.fetch_add(1, Ordering::Relaxed);
                warn!("Aging tick panicked, continuing with next period");
            }
        }
    }
    counters.running.store(false, Ordering::Release);
    info!("aging worker stopped");
}

/// Per filter slot holding at most one running worker.
#[derive(Debug, Default)]
pub(crate) struct WorkerSlot(Mutex<Option<AgingWorker>>);

impl WorkerSlot {
    pub(crate) fn start<F, T>(
        &self,
        name: &str,
        filter: &Arc<F>,
        period: Duration,
        ticker: T,
    ) -> Result<()>
    where
        F: Tick,
        T: Ticker,
    {
        let mut slot = self.lock()?;
        if slot.as_ref().is_some_and(AgingWorker::is_running) {
            return Err(FilterError::WorkerAlreadyRunning);
        }
        *slot = Some(AgingWorker::spawn(
            name,
            Arc::downgrade(filter),
            period,
            ticker,
        )?);
        Ok(())
    }

    /// Returns the final stats of the stopped worker, if one was started.
    pub(crate) fn stop(&self) -> Result<Option<WorkerStats>> {
        let worker = self.lock()?.take();
        worker.map(AgingWorker::stop).transpose()
    }

    pub(crate) fn stats(&self) -> Result<Option<WorkerStats>> {
        Ok(self.lock()?.as_ref().map(AgingWorker::stats))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<AgingWorker>>> {
        self.0.lock().map_err(|_| {
            FilterError::LockError("Failed to lock aging worker slot".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aging::{ManualTicker, SleepTicker};

    #[derive(Default)]
    struct CountingTick {
        calls: AtomicU64,
        fail_every: u64,
    }

    impl Tick for CountingTick {
        fn tick(&self) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_every > 0 && call % self.fail_every == 0 {
                return Err(FilterError::LockError("simulated".to_string()));
            }
            Ok(())
        }
    }

    struct PanickingTick;

    impl Tick for PanickingTick {
        fn tick(&self) -> Result<()> {
            panic!("tick exploded");
        }
    }

    #[test]
    fn test_worker_applies_manual_ticks() {
        let target = Arc::new(CountingTick::default());
        let (ticker, handle) = ManualTicker::new();
        let worker = AgingWorker::spawn(
            "test-aging",
            Arc::downgrade(&target),
            Duration::from_secs(3600),
            ticker,
        )
        .unwrap();

        assert!(handle.advance_by(3));
        assert_eq!(target.calls.load(Ordering::SeqCst), 3);
        assert_eq!(worker.stats().ticks, 3);

        drop(handle);
        let stats = worker.stop().unwrap();
        assert!(!stats.running);
        assert_eq!(stats.ticks, 3);
    }

    #[test]
    fn test_worker_survives_failed_ticks() {
        let target = Arc::new(CountingTick {
            fail_every: 2,
            ..Default::default()
        });
        let (ticker, handle) = ManualTicker::new();
        let worker = AgingWorker::spawn(
            "test-aging",
            Arc::downgrade(&target),
            Duration::from_secs(3600),
            ticker,
        )
        .unwrap();

        assert!(handle.advance_by(4));
        let stats = worker.stats();
        assert_eq!(stats.ticks, 2);
        assert_eq!(stats.failed_ticks, 2);
        assert!(stats.running);

        drop(handle);
        worker.stop().unwrap();
    }

    #[test]
    fn test_worker_survives_panicking_tick() {
        let target = Arc::new(PanickingTick);
        let (ticker, handle) = ManualTicker::new();
        let worker = AgingWorker::spawn(
            "test-aging",
            Arc::downgrade(&target),
            Duration::from_secs(3600),
            ticker,
        )
        .unwrap();

        assert!(handle.advance_by(2));
        assert_eq!(worker.stats().failed_ticks, 2);
        assert!(worker.is_running());

        drop(handle);
        worker.stop().unwrap();
    }

    #[test]
    fn test_worker_exits_when_filter_dropped() {
        let target = Arc::new(CountingTick::default());
        let (ticker, handle) = ManualTicker::new();
        let worker = AgingWorker::spawn(
            "test-aging",
            Arc::downgrade(&target),
            Duration::from_secs(3600),
            ticker,
        )
        .unwrap();

        drop(target);
        // Tick is received but the filter is gone, so no ack comes back
        assert!(!handle.advance());
        let stats = worker.stop().unwrap();
        assert!(!stats.running);
        assert_eq!(stats.ticks, 0);
    }

    #[test]
    fn test_stop_with_sleep_ticker() {
        let target = Arc::new(CountingTick::default());
        let worker = AgingWorker::spawn(
            "test-aging",
            Arc::downgrade(&target),
            Duration::from_millis(10),
            SleepTicker,
        )
        .unwrap();

        thread::sleep(Duration::from_millis(100));
        let stats = worker.stop().unwrap();
        assert!(!stats.running);
        assert!(stats.ticks >= 1);
    }

    #[test]
    fn test_cancel_through_stop_token() {
        let target = Arc::new(CountingTick::default());
        let worker = AgingWorker::spawn(
            "test-aging",
            Arc::downgrade(&target),
            Duration::from_millis(5),
            SleepTicker,
        )
        .unwrap();

        let token = worker.stop_token();
        assert!(!token.is_cancelled());
        token.cancel();

        thread::sleep(Duration::from_millis(50));
        assert!(!worker.is_running());
        let stats = worker.stop().unwrap();
        assert!(!stats.running);
    }

    struct PanickingTicker;

    impl Ticker for PanickingTicker {
        fn wait(&mut self, _period: Duration) -> bool {
            panic!("ticker exploded");
        }
    }

    #[test]
    fn test_stop_reports_panicked_thread() {
        let target = Arc::new(CountingTick::default());
        let worker = AgingWorker::spawn(
            "doomed-aging",
            Arc::downgrade(&target),
            Duration::from_secs(3600),
            PanickingTicker,
        )
        .unwrap();

        assert_eq!(
            worker.stop(),
            Err(FilterError::WorkerPanicked("doomed-aging".to_string()))
        );
    }

    #[test]
    fn test_slot_rejects_second_worker() {
        let target = Arc::new(CountingTick::default());
        let slot = WorkerSlot::default();
        slot.start("a", &target, Duration::from_millis(10), SleepTicker)
            .unwrap();
        assert_eq!(
            slot.start("b", &target, Duration::from_millis(10), SleepTicker),
            Err(FilterError::WorkerAlreadyRunning)
        );
        assert!(slot.stop().unwrap().is_some());
        assert!(slot.stop().unwrap().is_none());
    }
}

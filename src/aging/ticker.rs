use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread;
use std::time::Duration;

/// Source of aging ticks for a background worker.
///
/// Swapping the ticker is how time is injected: production code sleeps,
/// tests drive ticks by hand.
pub trait Ticker: Send + 'static {
    /// Blocks until the next tick is due. Returns `false` once no more ticks
    /// will be produced.
    fn wait(&mut self, period: Duration) -> bool;
}

/// Real time ticker, one tick per `period`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SleepTicker;

impl Ticker for SleepTicker {
    fn wait(&mut self, period: Duration) -> bool {
        thread::sleep(period);
        true
    }
}

/// Ticker driven from a [`ManualTickHandle`], ignores the period.
#[derive(Debug)]
pub struct ManualTicker {
    ticks: Receiver<()>,
    acks: SyncSender<()>,
    pending_ack: bool,
}

/// Test side of a [`ManualTicker`]. Dropping it closes the ticker.
#[derive(Debug)]
pub struct ManualTickHandle {
    ticks: SyncSender<()>,
    acks: Receiver<()>,
}

impl ManualTicker {
    pub fn new() -> (ManualTicker, ManualTickHandle) {
        let (tick_tx, tick_rx) = sync_channel(1);
        let (ack_tx, ack_rx) = sync_channel(1);
        (
            ManualTicker {
                ticks: tick_rx,
                acks: ack_tx,
                pending_ack: false,
            },
            ManualTickHandle {
                ticks: tick_tx,
                acks: ack_rx,
            },
        )
    }
}

impl Ticker for ManualTicker {
    fn wait(&mut self, _period: Duration) -> bool {
        // Coming back here means the previous tick has been fully applied
        if self.pending_ack {
            let _ = self.acks.send(());
        }
        self.pending_ack = self.ticks.recv().is_ok();
        self.pending_ack
    }
}

impl ManualTickHandle {
    /// Fires one tick and blocks until the worker has applied it.
    ///
    /// Returns `false` if the worker is gone or stopped before acknowledging.
    pub fn advance(&self) -> bool {
        if self.ticks.send(()).is_err() {
            return false;
        }
        self.acks.recv().is_ok()
    }

    pub fn advance_by(&self, ticks: usize) -> bool {
        (0..ticks).all(|_| self.advance())
    }
}

use anyhow::Result;
use log::warn;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

/// Longest single sleep while waiting for a tick; bounds stop latency.
const STOP_POLL: Duration = Duration::from_millis(20);

/// Shared stop signal observed by both loops.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Fixed-period tick scheduled on deadlines rather than sleep-after-work.
#[derive(Debug)]
pub struct Ticker {
    period: Duration,
    next: Instant,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next: Instant::now() + period,
        }
    }

    /// Sleep until the next tick. Returns `false` if stop was raised first.
    pub fn wait(&mut self, stop: &StopFlag) -> bool {
        loop {
            if stop.is_raised() {
                return false;
            }
            let now = Instant::now();
            if now >= self.next {
                break;
            }
            thread::sleep((self.next - now).min(STOP_POLL));
        }

        self.next += self.period;
        // after a stall, skip missed ticks instead of bursting
        let now = Instant::now();
        if self.next <= now {
            self.next = now + self.period;
        }
        true
    }
}

/// Raise `stop` on SIGINT/SIGTERM. Close the returned handle to end the
/// watcher thread.
pub fn watch_signals(stop: StopFlag) -> Result<Handle> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    let handle = signals.handle();
    thread::Builder::new()
        .name("signals".into())
        .spawn(move || {
            for sig in signals.forever() {
                warn!("received signal {sig}, stopping");
                stop.raise();
            }
        })?;
    Ok(handle)
}

//! Time sources for latency sampling and the measurement timer

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic nanosecond time source
pub trait Clock: Send + Sync {
    /// Nanoseconds since an arbitrary fixed origin
    fn now_nanos(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_nanos(&self) -> u64 {
        (**self).now_nanos()
    }
}

/// `Instant`-backed clock; the default for real runs
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Clock whose origin is now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now_nanos(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }
}

/// Clock that only moves when told to
///
/// Lets tests pin exact latencies: a stub backend advances it by a fixed
/// amount inside each call.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward
    pub fn advance(&self, nanos: u64) {
        self.now.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_nanos(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Wall-clock timer for a measurement window
///
/// Started once, possibly from any worker thread; read by the orchestrator.
#[derive(Debug, Default)]
pub struct Stopwatch {
    started: Mutex<Option<Instant>>,
}

impl Stopwatch {
    /// A stopwatch that has not started
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the window at the current instant
    pub fn start(&self) {
        *self.started.lock() = Some(Instant::now());
    }

    /// Whether `start` has been called
    pub fn is_started(&self) -> bool {
        self.started.lock().is_some()
    }

    /// Time since `start`; zero if never started
    pub fn elapsed(&self) -> Duration {
        self.started
            .lock()
            .map(|t| t.elapsed())
            .unwrap_or(Duration::ZERO)
    }
}

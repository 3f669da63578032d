//! Timing decorator around a backend
//!
//! Every data call is timed with the configured [`Clock`] and reported into
//! the shared [`Measurements`]:
//!
//! | Outcome | Slot | Latency |
//! |---------|------|---------|
//! | `Ok(Status::Ok)` | success variant | recorded |
//! | `Ok(other)` | `*_FAILED` variant | recorded |
//! | `Err(_)` | none | propagated, no sample |
//!
//! Until the shared [`WarmupTracker`] has counted its target number of calls
//! (across every decorator and every operation kind), reports go to
//! `report_warmup` instead.
//!
//! `init` and `cleanup` pass straight through.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use strata_bench_core::{Backend, Field, Operation, Result, Status};
use strata_bench_measurement::{Clock, Measurements, MonotonicClock};

/// Global call index shared by all decorators of one phase
#[derive(Debug)]
pub struct WarmupTracker {
    calls: AtomicU64,
    target: u64,
}

impl WarmupTracker {
    /// Tracker whose first `target` calls are warm-up
    pub fn new(target: u64) -> Self {
        Self {
            calls: AtomicU64::new(0),
            target,
        }
    }

    /// Claim the next call index; true if it falls inside warm-up
    #[inline]
    pub fn next_is_warmup(&self) -> bool {
        self.target > 0 && self.calls.fetch_add(1, Ordering::Relaxed) < self.target
    }

    /// Warm-up calls expected
    pub fn target(&self) -> u64 {
        self.target
    }

    /// Calls classified so far
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

/// Backend wrapper that times and reports every data call
pub struct TimedBackend<B, C = MonotonicClock> {
    inner: B,
    measurements: Arc<dyn Measurements>,
    warmup: Arc<WarmupTracker>,
    clock: C,
}

impl<B: Backend> TimedBackend<B> {
    /// Wrap `inner` using the monotonic clock
    pub fn new(
        inner: B,
        measurements: Arc<dyn Measurements>,
        warmup: Arc<WarmupTracker>,
    ) -> Self {
        Self::with_clock(inner, measurements, warmup, MonotonicClock::new())
    }
}

impl<B: Backend, C: Clock> TimedBackend<B, C> {
    /// Wrap `inner` using `clock` for latencies
    pub fn with_clock(
        inner: B,
        measurements: Arc<dyn Measurements>,
        warmup: Arc<WarmupTracker>,
        clock: C,
    ) -> Self {
        Self {
            inner,
            measurements,
            warmup,
            clock,
        }
    }

    /// The wrapped backend
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Unwrap, giving back the backend
    pub fn into_inner(self) -> B {
        self.inner
    }

    fn timed<F>(&self, op: Operation, call: F) -> Result<Status>
    where
        F: FnOnce(&B) -> Result<Status>,
    {
        let start = self.clock.now_nanos();
        let status = call(&self.inner)?;
        let elapsed = self.clock.now_nanos().saturating_sub(start);

        let slot = op.for_status(status);
        if self.warmup.next_is_warmup() {
            self.measurements.report_warmup(slot);
        } else {
            self.measurements.report(slot, elapsed);
        }
        Ok(status)
    }
}

impl<B: Backend, C: Clock> Backend for TimedBackend<B, C> {
    fn init(&self) -> Result<()> {
        self.inner.init()
    }

    fn cleanup(&self) -> Result<()> {
        self.inner.cleanup()
    }

    fn read(
        &self,
        table: &str,
        key: &str,
        fields: Option<&[String]>,
        result: &mut Vec<Field>,
    ) -> Result<Status> {
        self.timed(Operation::Read, |db| db.read(table, key, fields, result))
    }

    fn scan(
        &self,
        table: &str,
        start_key: &str,
        record_count: usize,
        fields: Option<&[String]>,
        result: &mut Vec<Vec<Field>>,
    ) -> Result<Status> {
        self.timed(Operation::Scan, |db| {
            db.scan(table, start_key, record_count, fields, result)
        })
    }

    fn update(&self, table: &str, key: &str, values: &[Field]) -> Result<Status> {
        self.timed(Operation::Update, |db| db.update(table, key, values))
    }

    fn insert(&self, table: &str, key: &str, values: &[Field]) -> Result<Status> {
        self.timed(Operation::Insert, |db| db.insert(table, key, values))
    }

    fn delete(&self, table: &str, key: &str) -> Result<Status> {
        self.timed(Operation::Delete, |db| db.delete(table, key))
    }
}

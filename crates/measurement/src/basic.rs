//! Fixed-size atomic aggregation
//!
//! One cache-line-independent set of counters per [`Operation`] slot:
//! count, latency sum, min and max. Every update is a single atomic RMW or a
//! short compare-and-retry loop, so reporters never wait on each other.
//!
//! # Memory Ordering
//!
//! All counters use Relaxed ordering: they synchronize nothing else, and
//! the status reader tolerates slightly stale values.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use strata_bench_core::Operation;

use crate::status::{scaled, WarmupCounters};
use crate::{LatencySnapshot, Measurements};

/// Sentinel for "no minimum yet"
const MIN_SENTINEL: u64 = u64::MAX;

/// Lower `slot` to `value` if `value` is smaller
///
/// Retries until either the stored value is already `<= value` or our CAS
/// wins, so a concurrent smaller sample is never overwritten.
#[inline]
fn update_min(slot: &AtomicU64, value: u64) {
    let mut current = slot.load(Ordering::Relaxed);
    while value < current {
        match slot.compare_exchange_weak(current, value, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => break,
            Err(observed) => current = observed,
        }
    }
}

/// Raise `slot` to `value` if `value` is larger
#[inline]
fn update_max(slot: &AtomicU64, value: u64) {
    let mut current = slot.load(Ordering::Relaxed);
    while value > current {
        match slot.compare_exchange_weak(current, value, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => break,
            Err(observed) => current = observed,
        }
    }
}

/// Count/sum/min/max per operation, all atomic
#[derive(Debug)]
pub struct BasicMeasurements {
    count: [AtomicU64; Operation::COUNT],
    latency_sum: [AtomicU64; Operation::COUNT],
    latency_min: [AtomicU64; Operation::COUNT],
    latency_max: [AtomicU64; Operation::COUNT],
    warmup: WarmupCounters,
}

impl BasicMeasurements {
    /// Empty aggregator with min sentinels at `u64::MAX`
    pub fn new() -> Self {
        Self {
            count: std::array::from_fn(|_| AtomicU64::new(0)),
            latency_sum: std::array::from_fn(|_| AtomicU64::new(0)),
            latency_min: std::array::from_fn(|_| AtomicU64::new(MIN_SENTINEL)),
            latency_max: std::array::from_fn(|_| AtomicU64::new(0)),
            warmup: WarmupCounters::new(),
        }
    }

    /// Measured calls recorded for `op`
    pub fn count(&self, op: Operation) -> u64 {
        self.count[op.index()].load(Ordering::Relaxed)
    }

    /// Smallest latency for `op`; `u64::MAX` until the first sample
    pub fn min(&self, op: Operation) -> u64 {
        self.latency_min[op.index()].load(Ordering::Relaxed)
    }

    /// Largest latency for `op`; zero until the first sample
    pub fn max(&self, op: Operation) -> u64 {
        self.latency_max[op.index()].load(Ordering::Relaxed)
    }

    /// Sum of latencies for `op`
    pub fn latency_sum(&self, op: Operation) -> u64 {
        self.latency_sum[op.index()].load(Ordering::Relaxed)
    }
}

impl Default for BasicMeasurements {
    fn default() -> Self {
        Self::new()
    }
}

impl Measurements for BasicMeasurements {
    fn report(&self, op: Operation, latency_ns: u64) {
        let i = op.index();
        self.count[i].fetch_add(1, Ordering::Relaxed);
        self.latency_sum[i].fetch_add(latency_ns, Ordering::Relaxed);
        update_min(&self.latency_min[i], latency_ns);
        update_max(&self.latency_max[i], latency_ns);
    }

    fn report_warmup(&self, op: Operation) {
        self.warmup.record(op);
    }

    fn set_warmup_target(&self, total: u64) {
        self.warmup.set_target(total);
    }

    fn status_msg(&self) -> String {
        let measured: u64 = Operation::ALL.iter().map(|&op| self.count(op)).sum();
        let mut msg = String::with_capacity(128);
        self.warmup.write_header(&mut msg, measured);

        for op in Operation::ALL {
            let cnt = self.count(op);
            if cnt == 0 {
                continue;
            }
            let avg = self.latency_sum(op) as f64 / cnt as f64;
            let _ = write!(
                msg,
                "\n[{}: Count={} Max={:.2} Min={:.2} Avg={:.2}]",
                op,
                cnt,
                scaled(self.max(op) as f64),
                scaled(self.min(op) as f64),
                scaled(avg),
            );
        }
        msg
    }

    fn snapshot(&self, op: Operation) -> Option<LatencySnapshot> {
        let count = self.count(op);
        if count == 0 {
            return None;
        }
        Some(LatencySnapshot {
            operation: op.as_str(),
            count,
            min_ns: self.min(op),
            max_ns: self.max(op),
            mean_ns: self.latency_sum(op) as f64 / count as f64,
            percentiles: Vec::new(),
        })
    }

    fn reset(&self) {
        for i in 0..Operation::COUNT {
            self.count[i].store(0, Ordering::Relaxed);
            self.latency_sum[i].store(0, Ordering::Relaxed);
            self.latency_min[i].store(MIN_SENTINEL, Ordering::Relaxed);
            self.latency_max[i].store(0, Ordering::Relaxed);
        }
        self.warmup.reset();
    }
}

//! Warm-up counters and status-line rendering shared by both strategies
//!
//! Status line layout:
//!
//! ```text
//! <total> operations; warmup: <done>/<target> (<pct>%);
//! [READ: Count=... Max=... Min=... Avg=...]
//! [UPDATE: ...]
//! ```
//!
//! `<total>` includes warm-up operations. The warm-up fragment appears only
//! while `done < target`. Latencies are recorded in nanoseconds and shown in
//! microseconds with two decimals.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use strata_bench_core::Operation;

/// Divisor from recorded units (ns) to displayed units (us)
pub const DISPLAY_SCALE: f64 = 1000.0;

/// Per-operation warm-up counts plus the expected total
#[derive(Debug)]
pub(crate) struct WarmupCounters {
    counts: [AtomicU64; Operation::COUNT],
    target: AtomicU64,
}

impl WarmupCounters {
    pub(crate) fn new() -> Self {
        Self {
            counts: std::array::from_fn(|_| AtomicU64::new(0)),
            target: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record(&self, op: Operation) {
        self.counts[op.index()].fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn set_target(&self, target: u64) {
        self.target.store(target, Ordering::Relaxed);
    }

    pub(crate) fn total(&self) -> u64 {
        self.counts
            .iter()
            .map(|c| c.load(Ordering::Relaxed))
            .sum()
    }

    /// Zero the counts; the target survives
    pub(crate) fn reset(&self) {
        for c in &self.counts {
            c.store(0, Ordering::Relaxed);
        }
    }

    /// Write the total header and, while warm-up is incomplete, its progress
    pub(crate) fn write_header(&self, out: &mut String, measured_total: u64) {
        let done = self.total();
        let target = self.target.load(Ordering::Relaxed);
        let _ = write!(out, "{} operations;", measured_total + done);
        if target > 0 && done < target {
            let pct = done as f64 / target as f64 * 100.0;
            let _ = write!(out, " warmup: {}/{} ({:.2}%);", done, target, pct);
        }
    }
}

/// Scale a raw latency for display
#[inline]
pub(crate) fn scaled(raw: f64) -> f64 {
    raw / DISPLAY_SCALE
}

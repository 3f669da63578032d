//! HDR-histogram aggregation
//!
//! One histogram per [`Operation`] slot, each behind its own lock. A report
//! holds exactly one slot lock for one record call; slots never contend with
//! each other. Exact min and max are tracked next to the histogram because
//! the histogram itself only answers within its precision bucket.

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use std::fmt::Write;
use strata_bench_core::{Error, Operation, Result};

use crate::status::{scaled, WarmupCounters};
use crate::{LatencySnapshot, Measurements};

/// Smallest trackable latency (ns)
const LOWEST_TRACKABLE: u64 = 1;
/// Largest trackable latency (ns): 100 seconds
const HIGHEST_TRACKABLE: u64 = 100_000_000_000;
/// Significant decimal digits kept per value
const SIGNIFICANT_FIGURES: u8 = 3;

/// Percentiles rendered in status lines and snapshots
pub const PERCENTILES: [f64; 4] = [90.0, 99.0, 99.9, 99.99];

struct Slot {
    hist: Histogram<u64>,
    min: u64,
    max: u64,
}

impl Slot {
    fn new() -> Result<Self> {
        let hist =
            Histogram::new_with_bounds(LOWEST_TRACKABLE, HIGHEST_TRACKABLE, SIGNIFICANT_FIGURES)
                .map_err(|e| Error::config(format!("histogram bounds: {:?}", e)))?;
        Ok(Self {
            hist,
            min: u64::MAX,
            max: 0,
        })
    }

    fn record(&mut self, latency_ns: u64) {
        // Out-of-range samples clamp to the bounds instead of being dropped
        self.hist.saturating_record(latency_ns);
        self.min = self.min.min(latency_ns);
        self.max = self.max.max(latency_ns);
    }

    fn clear(&mut self) {
        self.hist.reset();
        self.min = u64::MAX;
        self.max = 0;
    }
}

/// HDR histogram per operation with 90/99/99.9/99.99 percentiles
pub struct HistogramMeasurements {
    slots: [Mutex<Slot>; Operation::COUNT],
    warmup: WarmupCounters,
}

impl HistogramMeasurements {
    /// Allocate one histogram per slot covering 1 ns to 100 s at 3 digits
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the histogram rejects the bounds.
    pub fn new() -> Result<Self> {
        let mut built = Vec::with_capacity(Operation::COUNT);
        for _ in 0..Operation::COUNT {
            built.push(Mutex::new(Slot::new()?));
        }
        let slots: [Mutex<Slot>; Operation::COUNT] = built
            .try_into()
            .map_err(|_| Error::config("histogram slot count mismatch"))?;
        Ok(Self {
            slots,
            warmup: WarmupCounters::new(),
        })
    }

    /// Latency at `percentile` for `op`, or `None` if nothing was recorded
    pub fn value_at_percentile(&self, op: Operation, percentile: f64) -> Option<u64> {
        let slot = self.slots[op.index()].lock();
        if slot.hist.is_empty() {
            None
        } else {
            Some(slot.hist.value_at_percentile(percentile))
        }
    }
}

impl std::fmt::Debug for HistogramMeasurements {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistogramMeasurements")
            .field("warmup", &self.warmup)
            .finish_non_exhaustive()
    }
}

impl Measurements for HistogramMeasurements {
    fn report(&self, op: Operation, latency_ns: u64) {
        self.slots[op.index()].lock().record(latency_ns);
    }

    fn report_warmup(&self, op: Operation) {
        self.warmup.record(op);
    }

    fn set_warmup_target(&self, total: u64) {
        self.warmup.set_target(total);
    }

    fn status_msg(&self) -> String {
        let mut lines = String::with_capacity(256);
        let mut measured = 0u64;

        for op in Operation::ALL {
            let slot = self.slots[op.index()].lock();
            let count = slot.hist.len();
            if count == 0 {
                continue;
            }
            measured += count;
            let _ = write!(
                lines,
                "\n[{}: Count={} Max={:.2} Min={:.2} Avg={:.2}",
                op,
                count,
                scaled(slot.max as f64),
                scaled(slot.min as f64),
                scaled(slot.hist.mean()),
            );
            for p in PERCENTILES {
                let _ = write!(
                    lines,
                    " {}={:.2}",
                    p,
                    scaled(slot.hist.value_at_percentile(p) as f64)
                );
            }
            lines.push(']');
        }

        let mut msg = String::with_capacity(lines.len() + 64);
        self.warmup.write_header(&mut msg, measured);
        msg.push_str(&lines);
        msg
    }

    fn snapshot(&self, op: Operation) -> Option<LatencySnapshot> {
        let slot = self.slots[op.index()].lock();
        let count = slot.hist.len();
        if count == 0 {
            return None;
        }
        Some(LatencySnapshot {
            operation: op.as_str(),
            count,
            min_ns: slot.min,
            max_ns: slot.max,
            mean_ns: slot.hist.mean(),
            percentiles: PERCENTILES
                .iter()
                .map(|&p| (p, slot.hist.value_at_percentile(p)))
                .collect(),
        })
    }

    fn reset(&self) {
        for slot in &self.slots {
            slot.lock().clear();
        }
        self.warmup.reset();
    }
}

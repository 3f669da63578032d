//! Latency measurement for strata-bench
//!
//! Worker threads report every measured call into one shared
//! [`Measurements`] instance. Two interchangeable strategies implement it:
//!
//! | Strategy | Name | Per-operation state | Hot path |
//! |----------|------|---------------------|----------|
//! | [`BasicMeasurements`] | `basic` | count, sum, min, max | 2 `fetch_add` + CAS loops |
//! | [`HistogramMeasurements`] | `hdrhistogram` | HDR histogram | one short per-slot lock |
//!
//! The strategy is chosen once at startup from configuration via
//! [`MeasurementType::from_name`] and [`create_measurements`].
//!
//! # Consistency
//!
//! `status_msg` and `snapshot` read counters without stopping writers. A
//! snapshot taken mid-run may mix samples from slightly different instants;
//! it is a monitoring signal, not a final result.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod basic;
pub mod clock;
pub mod histogram;
pub mod status;

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use strata_bench_core::{Operation, Result};

pub use basic::BasicMeasurements;
pub use clock::{Clock, ManualClock, MonotonicClock, Stopwatch};
pub use histogram::HistogramMeasurements;

/// Shared latency aggregator
///
/// All methods take `&self` and must be safe to call from every worker
/// thread at once without blocking each other on a coarse lock.
pub trait Measurements: Send + Sync {
    /// Record one measured call of `op` that took `latency_ns`
    fn report(&self, op: Operation, latency_ns: u64);

    /// Count one warm-up call of `op`; latency is not recorded
    fn report_warmup(&self, op: Operation);

    /// Total warm-up calls expected across all threads
    fn set_warmup_target(&self, total: u64);

    /// One-line (plus one line per active operation) progress summary
    fn status_msg(&self) -> String;

    /// Point-in-time statistics for `op`, or `None` if nothing was recorded
    fn snapshot(&self, op: Operation) -> Option<LatencySnapshot>;

    /// Zero every counter and restore latency extrema sentinels
    fn reset(&self);
}

/// Statistics for one operation slot, latencies in nanoseconds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencySnapshot {
    /// Slot these statistics belong to
    pub operation: &'static str,
    /// Number of measured calls
    pub count: u64,
    /// Smallest latency
    pub min_ns: u64,
    /// Largest latency
    pub max_ns: u64,
    /// Mean latency
    pub mean_ns: f64,
    /// `(percentile, latency)` pairs; empty for the basic strategy
    pub percentiles: Vec<(f64, u64)>,
}

/// Available measurement strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementType {
    /// Atomic count/sum/min/max
    Basic,
    /// HDR histogram with percentiles
    HdrHistogram,
}

impl MeasurementType {
    /// Default strategy name
    pub const DEFAULT_NAME: &'static str = "basic";

    /// Resolve a configured name; unknown names yield `None`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "basic" => Some(MeasurementType::Basic),
            "hdrhistogram" => Some(MeasurementType::HdrHistogram),
            _ => None,
        }
    }

    /// Configuration name of this strategy
    pub fn name(self) -> &'static str {
        match self {
            MeasurementType::Basic => "basic",
            MeasurementType::HdrHistogram => "hdrhistogram",
        }
    }
}

impl fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build the aggregator for `kind`
///
/// # Errors
///
/// Returns an error if the histogram cannot be allocated with the built-in
/// bounds.
pub fn create_measurements(kind: MeasurementType) -> Result<Arc<dyn Measurements>> {
    tracing::debug!(measurement = %kind, "creating measurements");
    Ok(match kind {
        MeasurementType::Basic => Arc::new(BasicMeasurements::new()),
        MeasurementType::HdrHistogram => Arc::new(HistogramMeasurements::new()?),
    })
}

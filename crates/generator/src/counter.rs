//! Sequential counter generator

use std::sync::atomic::{AtomicU64, Ordering};
use strata_bench_core::Generator;

/// Hands out `start, start + 1, ...` to concurrent callers
///
/// Unbounded; used for ordered load-phase inserts.
#[derive(Debug)]
pub struct CounterGenerator {
    counter: AtomicU64,
}

impl CounterGenerator {
    /// Create a counter whose first value is `start`
    pub fn new(start: u64) -> Self {
        Self {
            counter: AtomicU64::new(start),
        }
    }
}

impl Generator<u64> for CounterGenerator {
    fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }

    fn last(&self) -> u64 {
        self.counter.load(Ordering::Relaxed).wrapping_sub(1)
    }
}

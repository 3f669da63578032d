//! Random key sequence with durability acknowledgments
//!
//! Handing out a key and that key being durably written are different
//! events: an insert may still be in flight, or may fail. Callers record
//! the second event with [`acknowledge`](RandomAcknowledgedCounterGenerator::acknowledge)
//! once the backend reports success.
//!
//! Acknowledgments are recorded only. They do not influence `next()` or
//! `last()`, and no contiguous "highest durable key" is derived from them.

use parking_lot::Mutex;
use std::collections::HashSet;
use strata_bench_core::Generator;

use crate::random_counter::RandomCounterGenerator;

/// [`RandomCounterGenerator`] plus a set of acknowledged values
#[derive(Debug)]
pub struct RandomAcknowledgedCounterGenerator {
    keys: RandomCounterGenerator,
    acknowledged: Mutex<HashSet<u64>>,
}

impl RandomAcknowledgedCounterGenerator {
    /// Shuffle `[start, start + max_count)` with the thread-local RNG
    pub fn new(start: u64, max_count: u64) -> Self {
        Self {
            keys: RandomCounterGenerator::new(start, max_count),
            acknowledged: Mutex::new(HashSet::new()),
        }
    }

    /// Shuffle with a seeded RNG for a reproducible order
    pub fn with_seed(start: u64, max_count: u64, seed: u64) -> Self {
        Self {
            keys: RandomCounterGenerator::with_seed(start, max_count, seed),
            acknowledged: Mutex::new(HashSet::new()),
        }
    }

    /// Record `value` as durably written. Idempotent.
    pub fn acknowledge(&self, value: u64) {
        self.acknowledged.lock().insert(value);
    }

    /// Whether `value` has been acknowledged
    pub fn is_acknowledged(&self, value: u64) -> bool {
        self.acknowledged.lock().contains(&value)
    }

    /// Number of distinct acknowledged values
    pub fn acknowledged_count(&self) -> usize {
        self.acknowledged.lock().len()
    }

    /// Values not yet handed out
    pub fn remaining(&self) -> usize {
        self.keys.remaining()
    }
}

impl Generator<u64> for RandomAcknowledgedCounterGenerator {
    fn next(&self) -> u64 {
        self.keys.next()
    }

    fn last(&self) -> u64 {
        self.keys.last()
    }
}

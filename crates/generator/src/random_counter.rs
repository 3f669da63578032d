//! Pre-shuffled, collision-free key sequence
//!
//! The whole range `[start, start + count)` is materialized and shuffled once
//! at construction. [`next`](Generator::next) then costs a single
//! `fetch_add` on a shared cursor: no per-call randomness and no lock on
//! the claim itself.
//!
//! # Exhaustion
//!
//! Once every slot has been claimed, further calls return `start`. This is a
//! defined fallback, not an error, so callers that over-consume keep running
//! (they will simply revisit `start`).

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};
use strata_bench_core::Generator;

/// Random permutation of `[start, start + count)` consumed concurrently
#[derive(Debug)]
pub struct RandomCounterGenerator {
    keys: Vec<u64>,
    cursor: AtomicUsize,
    start: u64,
    /// Last value handed out; written after the claim, under the lock
    last: Mutex<u64>,
}

impl RandomCounterGenerator {
    /// Shuffle `[start, start + count)` with the thread-local RNG
    pub fn new(start: u64, count: u64) -> Self {
        Self::with_rng(start, count, &mut rand::thread_rng())
    }

    /// Shuffle with a seeded RNG for a reproducible order
    pub fn with_seed(start: u64, count: u64, seed: u64) -> Self {
        Self::with_rng(start, count, &mut StdRng::seed_from_u64(seed))
    }

    fn with_rng<R: Rng + ?Sized>(start: u64, count: u64, rng: &mut R) -> Self {
        let mut keys: Vec<u64> = (start..start + count).collect();
        keys.shuffle(rng);
        Self {
            keys,
            cursor: AtomicUsize::new(0),
            start,
            last: Mutex::new(start.wrapping_sub(1)),
        }
    }

    /// First value of the range, also the exhaustion fallback
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Number of distinct values this generator can hand out
    pub fn capacity(&self) -> usize {
        self.keys.len()
    }

    /// Values not yet claimed
    pub fn remaining(&self) -> usize {
        self.keys
            .len()
            .saturating_sub(self.cursor.load(Ordering::Relaxed))
    }
}

impl Generator<u64> for RandomCounterGenerator {
    fn next(&self) -> u64 {
        let slot = self.cursor.fetch_add(1, Ordering::Relaxed);
        match self.keys.get(slot) {
            Some(&value) => {
                *self.last.lock() = value;
                value
            }
            None => self.start,
        }
    }

    fn last(&self) -> u64 {
        *self.last.lock()
    }
}

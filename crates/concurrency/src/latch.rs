//! Countdown latch
//!
//! A one-shot gate: N parties call [`CountDownLatch::count_down`], any number
//! of parties block in [`CountDownLatch::wait`] until the count reaches zero.
//! Once open the latch stays open.
//!
//! Used twice per run phase: once so the orchestrator learns that every
//! worker finished, and once so workers meet at the warm-up boundary.

use parking_lot::{Condvar, Mutex};
use std::time::Duration;

/// Countdown latch built on `parking_lot::{Mutex, Condvar}`
#[derive(Debug)]
pub struct CountDownLatch {
    count: Mutex<usize>,
    zero: Condvar,
}

impl CountDownLatch {
    /// Create a latch that opens after `count` calls to `count_down`
    ///
    /// A latch created with zero is open from the start.
    pub fn new(count: usize) -> Self {
        Self {
            count: Mutex::new(count),
            zero: Condvar::new(),
        }
    }

    /// Decrement the count, releasing all waiters when it reaches zero
    ///
    /// Calls past zero are no-ops.
    pub fn count_down(&self) {
        let mut count = self.count.lock();
        if *count == 0 {
            return;
        }
        *count -= 1;
        if *count == 0 {
            self.zero.notify_all();
        }
    }

    /// Block until the count reaches zero
    pub fn wait(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.zero.wait(&mut count);
        }
    }

    /// Block until the count reaches zero or `timeout` elapses
    ///
    /// Returns true if the latch is open. Only the status reporter uses
    /// this; worker coordination always goes through [`wait`](Self::wait).
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut count = self.count.lock();
        if *count == 0 {
            return true;
        }
        // Spurious wakeups are fine: the caller polls again on false.
        let _ = self.zero.wait_for(&mut count, timeout);
        *count == 0
    }

    /// Current count
    pub fn count(&self) -> usize {
        *self.count.lock()
    }
}

//! Token-bucket rate limiter
//!
//! [`RateLimiter::consume`] never rejects, it only delays. The bucket starts
//! empty and holds at most `burst` tokens, so a tight loop of `consume(1)`
//! calls settles at the configured rate almost immediately.
//!
//! ```text
//! tokens = min(burst, tokens + elapsed_secs * rate)
//! tokens -= n
//! wait   = max(0, -tokens) / rate
//! ```
//!
//! The debit happens under the lock, the sleep happens outside it. A caller
//! that drives the balance negative reserves future tokens; the next caller
//! sees the deeper debt and waits longer, which is what keeps the aggregate
//! rate across all threads at or below the target.

use parking_lot::Mutex;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Bucket {
    /// Tokens per second
    rate: f64,
    /// Maximum stored tokens
    capacity: f64,
    /// Current balance; negative while callers are waiting
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_refill = now;
    }
}

/// Throttles a stream of operations to a target rate
///
/// One instance is shared by all worker threads.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Limit to `ops_per_sec` with a burst allowance of one operation
    pub fn new(ops_per_sec: u64) -> Self {
        Self::with_burst(ops_per_sec, 1)
    }

    /// Limit to `ops_per_sec`, letting up to `burst` tokens accumulate
    ///
    /// Zero values are clamped to one.
    pub fn with_burst(ops_per_sec: u64, burst: u64) -> Self {
        if ops_per_sec == 0 {
            tracing::warn!("rate limiter configured with 0 ops/sec, clamping to 1");
        }
        Self {
            bucket: Mutex::new(Bucket {
                rate: ops_per_sec.max(1) as f64,
                capacity: burst.max(1) as f64,
                tokens: 0.0,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Target rate in operations per second
    pub fn rate(&self) -> f64 {
        self.bucket.lock().rate
    }

    /// Take `n` tokens, sleeping until they are available
    pub fn consume(&self, n: u64) {
        let wait = {
            let mut bucket = self.bucket.lock();
            bucket.refill(Instant::now());
            bucket.tokens -= n as f64;
            if bucket.tokens < 0.0 {
                Duration::from_secs_f64(-bucket.tokens / bucket.rate)
            } else {
                Duration::ZERO
            }
        };

        if !wait.is_zero() {
            thread::sleep(wait);
        }
    }
}

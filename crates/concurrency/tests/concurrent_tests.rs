//! Concurrent/Multi-threaded Tests for strata-bench-concurrency
//!
//! These tests use real threads to exercise:
//!
//! 1. **Latch release** - waiters block until the last count_down
//! 2. **Latch reuse as a rendezvous** - parties count down then wait together
//! 3. **Aggregate rate** - one limiter shared by many threads caps the total
//!
//! ## Running These Tests
//!
//! ```bash
//! cargo test --test concurrent_tests
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use strata_bench_concurrency::{CountDownLatch, RateLimiter};

// ============================================================================
// CountDownLatch
// ============================================================================

#[test]
fn test_waiters_released_by_mixed_counters() {
    const C: usize = 6;
    let latch = Arc::new(CountDownLatch::new(C));
    let released = Arc::new(AtomicUsize::new(0));

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let latch = Arc::clone(&latch);
            let released = Arc::clone(&released);
            thread::spawn(move || {
                latch.wait();
                released.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    // Count down C - 1 times from three different threads
    let counters: Vec<_> = (0..3)
        .map(|t| {
            let latch = Arc::clone(&latch);
            thread::spawn(move || {
                let n = if t == 0 { 1 } else { 2 };
                for _ in 0..n {
                    latch.count_down();
                }
            })
        })
        .collect();
    for h in counters {
        h.join().unwrap();
    }

    assert_eq!(latch.count(), 1);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(released.load(Ordering::SeqCst), 0);

    latch.count_down();
    for h in waiters {
        h.join().unwrap();
    }
    assert_eq!(released.load(Ordering::SeqCst), 4);

    // Future waits return immediately; extra count_downs are no-ops
    latch.count_down();
    latch.wait();
    assert_eq!(latch.count(), 0);
}

#[test]
fn test_rendezvous_all_parties_see_every_arrival() {
    const PARTIES: usize = 8;
    let latch = Arc::new(CountDownLatch::new(PARTIES));
    let arrived = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..PARTIES)
        .map(|_| {
            let latch = Arc::clone(&latch);
            let arrived = Arc::clone(&arrived);
            thread::spawn(move || {
                arrived.fetch_add(1, Ordering::SeqCst);
                latch.count_down();
                latch.wait();
                arrived.load(Ordering::SeqCst)
            })
        })
        .collect();

    for h in handles {
        assert_eq!(h.join().unwrap(), PARTIES);
    }
}

#[test]
fn test_wait_timeout_reports_progress() {
    let latch = Arc::new(CountDownLatch::new(1));
    assert!(!latch.wait_timeout(Duration::from_millis(10)));

    let l = Arc::clone(&latch);
    let h = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        l.count_down();
    });
    assert!(latch.wait_timeout(Duration::from_secs(10)));
    h.join().unwrap();
}

// ============================================================================
// RateLimiter
// ============================================================================

#[test]
fn test_shared_limiter_caps_aggregate_rate() {
    const RATE: u64 = 200;
    const THREADS: u64 = 4;
    const PER_THREAD: u64 = 25;
    let limiter = Arc::new(RateLimiter::new(RATE));

    let start = Instant::now();
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let limiter = Arc::clone(&limiter);
            thread::spawn(move || {
                for _ in 0..PER_THREAD {
                    limiter.consume(1);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    // 100 tokens from an empty bucket at 200/s
    let n = THREADS * PER_THREAD;
    let floor = Duration::from_secs_f64((n - 1) as f64 / RATE as f64);
    assert!(start.elapsed() >= floor, "{:?} < {:?}", start.elapsed(), floor);
}

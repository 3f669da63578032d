//! Worker thread routines
//!
//! A worker runs a fixed number of operations against its backend and then
//! counts down the shared completion latch. The count-down happens on every
//! exit path, including errors and panics, so the orchestrator and the status
//! reporter never wait on a worker that has already left.
//!
//! # Warm-up boundary
//!
//! [`run_client_with_warmup`] stops at iteration `warmup_ops`, meets every
//! other worker at the [`WarmupGate`], and only then continues with measured
//! operations. Exactly one worker, whichever wins a single compare-and-swap,
//! runs the gate's start hook (normally: start the measurement timer).

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use strata_bench_concurrency::{CountDownLatch, RateLimiter};
use strata_bench_core::{Backend, Result, Workload};
use tracing::debug;

/// Benchmark phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Insert the initial records
    Load,
    /// Issue transactions
    Run,
}

impl Phase {
    /// Lowercase name used in thread names and logs
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Load => "load",
            Phase::Run => "run",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one worker does
#[derive(Debug, Clone, Copy)]
pub struct ClientOptions {
    /// Operations to perform
    pub num_ops: u64,
    /// Load (insert) or run (transaction)
    pub phase: Phase,
    /// Call `Backend::init` before the first operation
    pub init_backend: bool,
    /// Call `Backend::cleanup` after the last operation
    pub cleanup_backend: bool,
}

/// Rendezvous for the warm-up to measurement transition
pub struct WarmupGate {
    warmup_ops: u64,
    arrived: CountDownLatch,
    started: AtomicBool,
    on_start: Box<dyn Fn() + Send + Sync>,
}

impl WarmupGate {
    /// Gate for `parties` workers that each run `warmup_ops` warm-up operations
    ///
    /// `on_start` runs exactly once, after every party has arrived.
    pub fn new<F>(parties: usize, warmup_ops: u64, on_start: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            warmup_ops,
            arrived: CountDownLatch::new(parties),
            started: AtomicBool::new(false),
            on_start: Box::new(on_start),
        }
    }

    /// Warm-up operations each worker runs before the boundary
    pub fn warmup_ops(&self) -> u64 {
        self.warmup_ops
    }

    /// Arrive, wait for every other party, then race to start measurement
    ///
    /// Returns true for the single caller that ran the start hook.
    pub fn arrive_and_wait(&self) -> bool {
        self.arrived.count_down();
        self.arrived.wait();
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            (self.on_start)();
            true
        } else {
            false
        }
    }

    /// Give up a party's slot without waiting
    ///
    /// Used by a worker that fails before reaching the boundary.
    pub fn release(&self) {
        self.arrived.count_down();
    }

    /// Whether the start hook has run
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Parties that have not yet arrived
    pub fn pending(&self) -> usize {
        self.arrived.count()
    }
}

impl fmt::Debug for WarmupGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarmupGate")
            .field("warmup_ops", &self.warmup_ops)
            .field("pending", &self.arrived.count())
            .field("started", &self.is_started())
            .finish()
    }
}

/// Counts down the completion latch when dropped
struct Completion<'a>(&'a CountDownLatch);

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        self.0.count_down();
    }
}

/// A party's place at the gate; released on drop if never used
struct GateSlot<'a> {
    gate: &'a WarmupGate,
    pending: bool,
}

impl GateSlot<'_> {
    fn arrive(&mut self) {
        if self.pending {
            self.pending = false;
            self.gate.arrive_and_wait();
        }
    }
}

impl Drop for GateSlot<'_> {
    fn drop(&mut self) {
        if self.pending {
            self.gate.release();
        }
    }
}

fn step(db: &dyn Backend, workload: &dyn Workload, phase: Phase, in_warmup: bool) -> Result<()> {
    match phase {
        Phase::Load => workload.do_insert(db),
        Phase::Run => workload.do_transaction(db, in_warmup),
    }
}

/// Run `opts.num_ops` operations, then count down `done`
///
/// Returns the number of operations performed.
///
/// # Errors
///
/// Propagates the first error from `init`, an operation, or `cleanup`.
/// `done` is counted down regardless.
pub fn run_client(
    db: &dyn Backend,
    workload: &dyn Workload,
    opts: &ClientOptions,
    limiter: Option<&RateLimiter>,
    done: &CountDownLatch,
) -> Result<u64> {
    let _done = Completion(done);

    if opts.init_backend {
        db.init()?;
    }
    for _ in 0..opts.num_ops {
        if let Some(limiter) = limiter {
            limiter.consume(1);
        }
        step(db, workload, opts.phase, false)?;
    }
    if opts.cleanup_backend {
        db.cleanup()?;
    }
    debug!(phase = %opts.phase, ops = opts.num_ops, "client finished");
    Ok(opts.num_ops)
}

/// Like [`run_client`], with a warm-up boundary at `gate.warmup_ops()`
///
/// Iterations before the boundary are passed to the workload as warm-up.
///
/// # Errors
///
/// As [`run_client`]. A worker that fails before the boundary releases its
/// gate slot so the other workers are not held forever.
pub fn run_client_with_warmup(
    db: &dyn Backend,
    workload: &dyn Workload,
    opts: &ClientOptions,
    limiter: Option<&RateLimiter>,
    done: &CountDownLatch,
    gate: &WarmupGate,
) -> Result<u64> {
    let _done = Completion(done);
    let mut slot = GateSlot {
        gate,
        pending: true,
    };
    let warmup_ops = gate.warmup_ops();

    if opts.init_backend {
        db.init()?;
    }
    for i in 0..opts.num_ops {
        if i == warmup_ops {
            slot.arrive();
        }
        if let Some(limiter) = limiter {
            limiter.consume(1);
        }
        step(db, workload, opts.phase, i < warmup_ops)?;
    }
    // Fewer operations than warm-up: still complete the rendezvous
    slot.arrive();

    if opts.cleanup_backend {
        db.cleanup()?;
    }
    debug!(
        phase = %opts.phase,
        ops = opts.num_ops,
        warmup_ops,
        "client finished"
    );
    Ok(opts.num_ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::sync::Arc;
    use std::thread;
    use strata_bench_core::{Error, Field, Status};

    /// Counts lifecycle calls; data calls never happen
    #[derive(Default)]
    struct Lifecycle {
        inits: AtomicU64,
        cleanups: AtomicU64,
    }

    impl Backend for Lifecycle {
        fn init(&self) -> Result<()> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn cleanup(&self) -> Result<()> {
            self.cleanups.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn read(&self, _: &str, _: &str, _: Option<&[String]>, _: &mut Vec<Field>) -> Result<Status> {
            Ok(Status::Ok)
        }
        fn scan(
            &self,
            _: &str,
            _: &str,
            _: usize,
            _: Option<&[String]>,
            _: &mut Vec<Vec<Field>>,
        ) -> Result<Status> {
            Ok(Status::Ok)
        }
        fn update(&self, _: &str, _: &str, _: &[Field]) -> Result<Status> {
            Ok(Status::Ok)
        }
        fn insert(&self, _: &str, _: &str, _: &[Field]) -> Result<Status> {
            Ok(Status::Ok)
        }
        fn delete(&self, _: &str, _: &str) -> Result<Status> {
            Ok(Status::Ok)
        }
    }

    /// Counts calls by kind and warm-up flag; optionally fails at call `fail_at`
    #[derive(Default)]
    struct Tally {
        inserts: AtomicU64,
        warm: AtomicU64,
        measured: AtomicU64,
        fail_at: Option<u64>,
    }

    impl Workload for Tally {
        fn do_insert(&self, _db: &dyn Backend) -> Result<()> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn do_transaction(&self, _db: &dyn Backend, in_warmup: bool) -> Result<()> {
            let n = self.warm.load(Ordering::SeqCst) + self.measured.load(Ordering::SeqCst);
            if Some(n) == self.fail_at {
                return Err(Error::backend("injected"));
            }
            if in_warmup {
                self.warm.fetch_add(1, Ordering::SeqCst);
            } else {
                self.measured.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    fn opts(num_ops: u64, phase: Phase) -> ClientOptions {
        ClientOptions {
            num_ops,
            phase,
            init_backend: true,
            cleanup_backend: true,
        }
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::Load.to_string(), "load");
        assert_eq!(Phase::Run.as_str(), "run");
    }

    #[test]
    fn test_plain_load() {
        let db = Lifecycle::default();
        let work = Tally::default();
        let done = CountDownLatch::new(1);
        let n = run_client(&db, &work, &opts(7, Phase::Load), None, &done).unwrap();
        assert_eq!(n, 7);
        assert_eq!(work.inserts.load(Ordering::SeqCst), 7);
        assert_eq!(db.inits.load(Ordering::SeqCst), 1);
        assert_eq!(db.cleanups.load(Ordering::SeqCst), 1);
        assert_eq!(done.count(), 0);
    }

    #[test]
    fn test_plain_run_never_warm() {
        let db = Lifecycle::default();
        let work = Tally::default();
        let done = CountDownLatch::new(1);
        let o = ClientOptions {
            init_backend: false,
            cleanup_backend: false,
            ..opts(5, Phase::Run)
        };
        run_client(&db, &work, &o, None, &done).unwrap();
        assert_eq!(work.measured.load(Ordering::SeqCst), 5);
        assert_eq!(work.warm.load(Ordering::SeqCst), 0);
        assert_eq!(db.inits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_error_still_counts_down() {
        let db = Lifecycle::default();
        let work = Tally {
            fail_at: Some(2),
            ..Default::default()
        };
        let done = CountDownLatch::new(1);
        assert!(run_client(&db, &work, &opts(5, Phase::Run), None, &done).is_err());
        assert_eq!(done.count(), 0);
        // Cleanup is skipped after an error
        assert_eq!(db.cleanups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_warmup_split_single_thread() {
        let db = Lifecycle::default();
        let work = Tally::default();
        let done = CountDownLatch::new(1);
        let gate = WarmupGate::new(1, 3, || {});
        run_client_with_warmup(&db, &work, &opts(10, Phase::Run), None, &done, &gate).unwrap();
        assert_eq!(work.warm.load(Ordering::SeqCst), 3);
        assert_eq!(work.measured.load(Ordering::SeqCst), 7);
        assert!(gate.is_started());
    }

    #[test]
    fn test_start_hook_runs_once() {
        const THREADS: usize = 4;
        let starts = Arc::new(AtomicU64::new(0));
        let hook = Arc::clone(&starts);
        let gate = WarmupGate::new(THREADS, 10, move || {
            hook.fetch_add(1, Ordering::SeqCst);
        });
        let done = CountDownLatch::new(THREADS);
        let db = Lifecycle::default();
        let work = Tally::default();

        thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| {
                    run_client_with_warmup(&db, &work, &opts(20, Phase::Run), None, &done, &gate)
                        .unwrap()
                });
            }
        });

        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(work.warm.load(Ordering::SeqCst), 40);
        assert_eq!(work.measured.load(Ordering::SeqCst), 40);
        assert_eq!(done.count(), 0);
    }

    #[test]
    fn test_failure_before_boundary_releases_gate() {
        let gate = WarmupGate::new(2, 5, || {});
        let done = CountDownLatch::new(2);
        let db = Lifecycle::default();
        let failing = Tally {
            fail_at: Some(1),
            ..Default::default()
        };
        let healthy = Tally::default();

        thread::scope(|s| {
            let bad = s.spawn(|| {
                run_client_with_warmup(&db, &failing, &opts(10, Phase::Run), None, &done, &gate)
            });
            let good = s.spawn(|| {
                run_client_with_warmup(&db, &healthy, &opts(10, Phase::Run), None, &done, &gate)
            });
            assert!(bad.join().unwrap().is_err());
            assert_eq!(good.join().unwrap().unwrap(), 10);
        });
        assert_eq!(done.count(), 0);
        assert_eq!(gate.pending(), 0);
    }

    #[test]
    fn test_short_worker_still_arrives() {
        let gate = WarmupGate::new(1, 5, || {});
        let done = CountDownLatch::new(1);
        let db = Lifecycle::default();
        let work = Tally::default();
        run_client_with_warmup(&db, &work, &opts(3, Phase::Run), None, &done, &gate).unwrap();
        assert!(gate.is_started());
        assert_eq!(work.warm.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_rate_limited_client() {
        let db = Lifecycle::default();
        let work = Tally::default();
        let done = CountDownLatch::new(1);
        let limiter = RateLimiter::new(200);
        let start = std::time::Instant::now();
        run_client(&db, &work, &opts(11, Phase::Run), Some(&limiter), &done).unwrap();
        // 11 tokens from an empty bucket at 200/s
        assert!(start.elapsed() >= std::time::Duration::from_millis(50));
    }
}

//! Phase orchestration
//!
//! For each phase the runner:
//! 1. builds one backend per thread through the caller's factory and wraps
//!    it in a [`TimedBackend`]
//! 2. spawns the workers (and the status reporter) on scoped threads named
//!    `strata-bench-{phase}-{i}`
//! 3. waits for every worker, then returns a [`PhaseReport`]
//!
//! The run phase uses the warm-up routine when the configured per-thread
//! warm-up is non-zero; its elapsed time starts at the warm-up boundary.
//!
//! # Fatal errors
//!
//! [`FatalPolicy::Exit`] terminates the process from the failing worker with
//! exit status 1 and no report. [`FatalPolicy::Propagate`] lets every other
//! worker finish and returns the first error in thread order.

use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use strata_bench_concurrency::{CountDownLatch, RateLimiter};
use strata_bench_core::{Backend, Error, Operation, Result, Workload};
use strata_bench_measurement::{Clock, LatencySnapshot, Measurements, MonotonicClock, Stopwatch};
use tracing::{debug, error, info};

use crate::client::{run_client, run_client_with_warmup, ClientOptions, Phase, WarmupGate};
use crate::config::BenchConfig;
use crate::status::report_status;
use crate::timed::{TimedBackend, WarmupTracker};

/// What a worker error does to the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FatalPolicy {
    /// Log, print to stderr, and exit with status 1
    Exit,
    /// Return the error from [`Runner::run_phase`]
    #[default]
    Propagate,
}

/// Outcome of one phase
#[derive(Debug, Clone, Serialize)]
pub struct PhaseReport {
    /// Phase that ran
    pub phase: Phase,
    /// Worker threads
    pub threads: usize,
    /// Operations performed, warm-up included
    pub operations: u64,
    /// Operations after the warm-up boundary
    pub measured_operations: u64,
    /// Measurement window
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    /// `measured_operations` per second of `elapsed`
    pub throughput: f64,
    /// Per-operation latency statistics at phase end
    pub latencies: Vec<LatencySnapshot>,
}

fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Log and terminate the process
fn fail_fast(err: &Error) -> ! {
    error!(error = %err, "fatal error, aborting run");
    eprintln!("strata-bench: {}", err);
    std::process::exit(1)
}

/// Drives load and run phases against shared measurements
pub struct Runner {
    config: BenchConfig,
    measurements: Arc<dyn Measurements>,
    policy: FatalPolicy,
}

impl Runner {
    /// Runner that propagates worker errors
    pub fn new(config: BenchConfig, measurements: Arc<dyn Measurements>) -> Self {
        Self {
            config,
            measurements,
            policy: FatalPolicy::default(),
        }
    }

    /// Set the fatal error policy
    pub fn with_policy(mut self, policy: FatalPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Shared measurements
    pub fn measurements(&self) -> &Arc<dyn Measurements> {
        &self.measurements
    }

    /// Run `phase` with one backend per thread from `factory`
    ///
    /// # Errors
    ///
    /// Returns the factory's error, a thread spawn failure, or (under
    /// [`FatalPolicy::Propagate`]) the first worker error.
    pub fn run_phase<B, F>(
        &self,
        phase: Phase,
        workload: &dyn Workload,
        factory: F,
    ) -> Result<PhaseReport>
    where
        B: Backend,
        F: FnMut(usize) -> Result<B>,
    {
        self.run_phase_with_clock(phase, workload, factory, MonotonicClock::new())
    }

    /// [`run_phase`](Self::run_phase) with an explicit latency clock
    pub fn run_phase_with_clock<B, F, C>(
        &self,
        phase: Phase,
        workload: &dyn Workload,
        mut factory: F,
        clock: C,
    ) -> Result<PhaseReport>
    where
        B: Backend,
        F: FnMut(usize) -> Result<B>,
        C: Clock + Clone,
    {
        let threads = self.config.threads.max(1);
        let ops = self.config.ops_per_thread(phase);
        let warmup_per_thread = match phase {
            Phase::Load => 0,
            Phase::Run => self.config.warmup_per_thread(),
        };
        let warmup_total = warmup_per_thread * threads as u64;

        self.measurements.set_warmup_target(warmup_total);
        let tracker = Arc::new(WarmupTracker::new(warmup_total));
        let backends = (0..threads)
            .map(|i| {
                Ok(TimedBackend::with_clock(
                    factory(i)?,
                    Arc::clone(&self.measurements),
                    Arc::clone(&tracker),
                    clock.clone(),
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let limiter = self.config.target_ops_per_sec.map(RateLimiter::new);
        let latch = CountDownLatch::new(threads);
        let done = &latch;
        let stopwatch = Arc::new(Stopwatch::new());
        let gate = (warmup_per_thread > 0).then(|| {
            let sw = Arc::clone(&stopwatch);
            WarmupGate::new(threads, warmup_per_thread, move || {
                info!("warm-up complete, measurement started");
                sw.start();
            })
        });
        if gate.is_none() {
            stopwatch.start();
        }

        info!(
            %phase,
            threads,
            operations = ops.iter().sum::<u64>(),
            warmup = warmup_total,
            "starting phase"
        );
        let phase_start = Instant::now();
        let measurements: &dyn Measurements = &*self.measurements;
        let policy = self.policy;

        let (results, spawn_error, elapsed) = thread::scope(|s| {
            let reporter = self
                .config
                .status_interval()
                .map(|iv| s.spawn(move || report_status(done, measurements, iv, phase_start)));

            let mut handles = Vec::with_capacity(threads);
            let mut spawn_error = None;
            for (i, db) in backends.iter().enumerate() {
                let opts = ClientOptions {
                    num_ops: ops[i],
                    phase,
                    init_backend: true,
                    cleanup_backend: true,
                };
                let (gate, limiter) = (gate.as_ref(), limiter.as_ref());
                let spawned = thread::Builder::new()
                    .name(format!("strata-bench-{}-{}", phase, i))
                    .spawn_scoped(s, move || {
                        debug!(thread = i, ops = opts.num_ops, "worker started");
                        let outcome = match gate {
                            Some(gate) => {
                                run_client_with_warmup(db, workload, &opts, limiter, done, gate)
                            }
                            None => run_client(db, workload, &opts, limiter, done),
                        };
                        outcome.map_err(|e| {
                            let e = e.in_worker(i);
                            if policy == FatalPolicy::Exit {
                                fail_fast(&e);
                            }
                            error!(error = %e, "worker failed");
                            e
                        })
                    });
                match spawned {
                    Ok(h) => handles.push(h),
                    Err(e) => {
                        // Stand in for the workers that never started
                        for _ in i..threads {
                            done.count_down();
                            if let Some(g) = gate {
                                g.release();
                            }
                        }
                        spawn_error = Some(Error::from(e));
                        break;
                    }
                }
            }

            let results: Vec<Result<u64>> = handles
                .into_iter()
                .enumerate()
                .map(|(i, h)| {
                    h.join().unwrap_or_else(|_| {
                        Err(Error::backend("worker thread panicked").in_worker(i))
                    })
                })
                .collect();
            let elapsed = stopwatch.elapsed();
            if let Some(r) = reporter {
                let _ = r.join();
            }
            (results, spawn_error, elapsed)
        });

        if let Some(e) = spawn_error {
            return Err(e);
        }
        let mut operations = 0;
        for result in results {
            operations += result?;
        }

        let measured_operations = operations.saturating_sub(warmup_total);
        let secs = elapsed.as_secs_f64();
        let throughput = if secs > 0.0 {
            measured_operations as f64 / secs
        } else {
            0.0
        };
        let latencies = Operation::ALL
            .iter()
            .filter_map(|&op| self.measurements.snapshot(op))
            .collect();

        info!(
            %phase,
            operations,
            elapsed_secs = secs,
            throughput,
            "phase finished"
        );
        Ok(PhaseReport {
            phase,
            threads,
            operations,
            measured_operations,
            elapsed,
            throughput,
            latencies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use strata_bench_core::{Field, Status};
    use strata_bench_measurement::BasicMeasurements;
    use strata_bench_workload::WorkloadOptions;

    /// Inserts on load, one update per transaction
    struct Updates;

    impl Workload for Updates {
        fn do_insert(&self, db: &dyn Backend) -> Result<()> {
            db.insert("t", "k", &[])?;
            Ok(())
        }
        fn do_transaction(&self, db: &dyn Backend, _in_warmup: bool) -> Result<()> {
            db.update("t", "k", &[])?;
            Ok(())
        }
    }

    /// OK for everything; fails fatally once `budget` data calls are used up
    struct Budget {
        left: Arc<AtomicU64>,
    }

    impl Budget {
        fn spend(&self) -> Result<Status> {
            self.left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .map(|_| Status::Ok)
                .map_err(|_| Error::backend("budget exhausted"))
        }
    }

    impl Backend for Budget {
        fn init(&self) -> Result<()> {
            Ok(())
        }
        fn cleanup(&self) -> Result<()> {
            Ok(())
        }
        fn read(&self, _: &str, _: &str, _: Option<&[String]>, _: &mut Vec<Field>) -> Result<Status> {
            self.spend()
        }
        fn scan(
            &self,
            _: &str,
            _: &str,
            _: usize,
            _: Option<&[String]>,
            _: &mut Vec<Vec<Field>>,
        ) -> Result<Status> {
            self.spend()
        }
        fn update(&self, _: &str, _: &str, _: &[Field]) -> Result<Status> {
            self.spend()
        }
        fn insert(&self, _: &str, _: &str, _: &[Field]) -> Result<Status> {
            self.spend()
        }
        fn delete(&self, _: &str, _: &str) -> Result<Status> {
            self.spend()
        }
    }

    fn config(threads: usize, records: u64, ops: u64, warmup: u64) -> BenchConfig {
        BenchConfig {
            threads,
            warmup_ops: warmup,
            status_interval_secs: 0,
            workload: WorkloadOptions {
                record_count: records,
                operation_count: ops,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn budget(n: u64) -> impl FnMut(usize) -> Result<Budget> {
        let left = Arc::new(AtomicU64::new(n));
        move |_| {
            Ok(Budget {
                left: Arc::clone(&left),
            })
        }
    }

    #[test]
    fn test_load_phase_report() {
        let m = Arc::new(BasicMeasurements::new());
        let runner = Runner::new(config(3, 10, 0, 0), m.clone());
        let report = runner
            .run_phase(Phase::Load, &Updates, budget(u64::MAX))
            .unwrap();
        assert_eq!(report.phase, Phase::Load);
        assert_eq!(report.threads, 3);
        assert_eq!(report.operations, 10);
        assert_eq!(report.measured_operations, 10);
        assert_eq!(m.count(Operation::Insert), 10);
        assert_eq!(report.latencies.len(), 1);
        assert_eq!(report.latencies[0].operation, "INSERT");
    }

    #[test]
    fn test_run_phase_with_warmup() {
        let m = Arc::new(BasicMeasurements::new());
        let runner = Runner::new(config(4, 0, 100, 20), m.clone());
        let report = runner
            .run_phase(Phase::Run, &Updates, budget(u64::MAX))
            .unwrap();
        assert_eq!(report.operations, 100);
        assert_eq!(report.measured_operations, 80);
        assert_eq!(m.count(Operation::Update), 80);
        assert!(m.status_msg().starts_with("100 operations;"));
    }

    #[test]
    fn test_warmup_ignored_for_load() {
        let m = Arc::new(BasicMeasurements::new());
        let runner = Runner::new(config(2, 10, 100, 10), m.clone());
        let report = runner
            .run_phase(Phase::Load, &Updates, budget(u64::MAX))
            .unwrap();
        assert_eq!(report.measured_operations, 10);
        assert_eq!(m.count(Operation::Insert), 10);
    }

    #[test]
    fn test_propagate_returns_worker_error() {
        let m = Arc::new(BasicMeasurements::new());
        let runner = Runner::new(config(2, 0, 100, 0), m);
        let err = runner
            .run_phase(Phase::Run, &Updates, budget(10))
            .unwrap_err();
        assert!(matches!(err, Error::Worker { .. }), "{}", err);
        assert!(err.to_string().contains("budget exhausted"));
    }

    #[test]
    fn test_propagate_during_warmup_does_not_hang() {
        let m = Arc::new(BasicMeasurements::new());
        let runner = Runner::new(config(4, 0, 400, 200), m);
        // Fails well before any thread reaches its 50th operation
        let err = runner
            .run_phase(Phase::Run, &Updates, budget(20))
            .unwrap_err();
        assert!(matches!(err, Error::Worker { .. }));
    }

    #[test]
    fn test_factory_error_aborts_before_spawning() {
        let m = Arc::new(BasicMeasurements::new());
        let runner = Runner::new(config(2, 10, 10, 0), m.clone());
        let err = runner
            .run_phase(Phase::Load, &Updates, |i| -> Result<Budget> {
                Err(Error::config(format!("no backend {}", i)))
            })
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(m.snapshot(Operation::Insert).is_none());
    }

    #[test]
    fn test_report_serializes_elapsed_secs() {
        let m = Arc::new(BasicMeasurements::new());
        let runner = Runner::new(config(1, 5, 0, 0), m);
        let report = runner
            .run_phase(Phase::Load, &Updates, budget(u64::MAX))
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["phase"], "load");
        assert_eq!(json["operations"], 5);
        assert!(json["elapsed_secs"].is_f64());
    }
}

//! End-to-end harness behaviour through the top-level crate
//!
//! Uses stub backends so latencies and statuses are exact.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use strata_bench::{
    create_measurements, Backend, BenchConfig, Error, Field, ManualClock, MeasurementType,
    Operation, Phase, Result, Runner, Status, WarmupGate, Workload, WorkloadOptions,
};

// ============================================================================
// Stubs
// ============================================================================

/// Answers `status` to every data call after advancing a shared clock
struct Stub {
    clock: Arc<ManualClock>,
    cost: u64,
    status: Status,
}

impl Stub {
    fn call(&self) -> Result<Status> {
        self.clock.advance(self.cost);
        Ok(self.status)
    }
}

impl Backend for Stub {
    fn init(&self) -> Result<()> {
        Ok(())
    }

    fn cleanup(&self) -> Result<()> {
        Ok(())
    }

    fn read(
        &self,
        _table: &str,
        _key: &str,
        _fields: Option<&[String]>,
        _result: &mut Vec<Field>,
    ) -> Result<Status> {
        self.call()
    }

    fn scan(
        &self,
        _table: &str,
        _start_key: &str,
        _record_count: usize,
        _fields: Option<&[String]>,
        _result: &mut Vec<Vec<Field>>,
    ) -> Result<Status> {
        self.call()
    }

    fn update(&self, _table: &str, _key: &str, _values: &[Field]) -> Result<Status> {
        self.call()
    }

    fn insert(&self, _table: &str, _key: &str, _values: &[Field]) -> Result<Status> {
        self.call()
    }

    fn delete(&self, _table: &str, _key: &str) -> Result<Status> {
        self.call()
    }
}

/// One read per transaction
struct Reads;

impl Workload for Reads {
    fn do_insert(&self, db: &dyn Backend) -> Result<()> {
        db.insert("usertable", "k", &[])?;
        Ok(())
    }

    fn do_transaction(&self, db: &dyn Backend, _in_warmup: bool) -> Result<()> {
        let mut out = Vec::new();
        db.read("usertable", "k", None, &mut out)?;
        Ok(())
    }
}

/// Fails every transaction with a backend error
struct Broken;

impl Workload for Broken {
    fn do_insert(&self, _db: &dyn Backend) -> Result<()> {
        Ok(())
    }

    fn do_transaction(&self, _db: &dyn Backend, _in_warmup: bool) -> Result<()> {
        Err(Error::backend("connection reset"))
    }
}

fn config(threads: usize, ops: u64, warmup: u64, measurement: &str) -> BenchConfig {
    BenchConfig {
        threads,
        warmup_ops: warmup,
        measurement_type: measurement.to_string(),
        status_interval_secs: 0,
        workload: WorkloadOptions {
            record_count: 1,
            operation_count: ops,
            read_proportion: 1.0,
            update_proportion: 0.0,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn stub(clock: &Arc<ManualClock>, status: Status) -> impl FnMut(usize) -> Result<Stub> + '_ {
    move |_| {
        Ok(Stub {
            clock: Arc::clone(clock),
            cost: 1_000,
            status,
        })
    }
}

// ============================================================================
// Exact latencies
// ============================================================================

#[test]
fn test_fixed_latency_basic_summary() {
    let config = config(1, 100, 0, "basic");
    let measurements = create_measurements(MeasurementType::Basic).unwrap();
    let runner = Runner::new(config, Arc::clone(&measurements));
    let clock = Arc::new(ManualClock::new());

    let report = runner
        .run_phase_with_clock(Phase::Run, &Reads, stub(&clock, Status::Ok), Arc::clone(&clock))
        .unwrap();

    assert_eq!(report.operations, 100);
    assert_eq!(
        measurements.status_msg(),
        "100 operations;\n[READ: Count=100 Max=1.00 Min=1.00 Avg=1.00]"
    );
}

#[test]
fn test_fixed_latency_histogram_percentiles() {
    let config = config(1, 100, 0, "hdrhistogram");
    let measurements = create_measurements(MeasurementType::HdrHistogram).unwrap();
    let runner = Runner::new(config, Arc::clone(&measurements));
    let clock = Arc::new(ManualClock::new());

    runner
        .run_phase_with_clock(Phase::Run, &Reads, stub(&clock, Status::Ok), Arc::clone(&clock))
        .unwrap();

    let snap = measurements.snapshot(Operation::Read).unwrap();
    assert_eq!(snap.count, 100);
    assert_eq!(snap.min_ns, 1_000);
    assert_eq!(snap.max_ns, 1_000);
    assert!(!snap.percentiles.is_empty());
    for (_, value) in &snap.percentiles {
        // Histogram buckets at three significant figures
        assert!((999..=1_001).contains(value), "{}", value);
    }
}

// ============================================================================
// Status routing
// ============================================================================

#[test]
fn test_not_found_lands_in_failed_slot() {
    let config = config(2, 50, 0, "basic");
    let measurements = create_measurements(MeasurementType::Basic).unwrap();
    let runner = Runner::new(config, Arc::clone(&measurements));
    let clock = Arc::new(ManualClock::new());

    runner
        .run_phase_with_clock(
            Phase::Run,
            &Reads,
            stub(&clock, Status::NotFound),
            Arc::clone(&clock),
        )
        .unwrap();

    assert!(measurements.snapshot(Operation::Read).is_none());
    assert_eq!(measurements.snapshot(Operation::ReadFailed).unwrap().count, 50);
    assert!(measurements.status_msg().contains("[READ-FAILED: Count=50"));
}

// ============================================================================
// Warm-up
// ============================================================================

#[test]
fn test_warmup_excluded_from_measurements() {
    let config = config(4, 200, 40, "basic");
    config.validate().unwrap();
    let measurements = create_measurements(MeasurementType::Basic).unwrap();
    let runner = Runner::new(config, Arc::clone(&measurements));
    let clock = Arc::new(ManualClock::new());

    let report = runner
        .run_phase_with_clock(Phase::Run, &Reads, stub(&clock, Status::Ok), Arc::clone(&clock))
        .unwrap();

    assert_eq!(report.operations, 200);
    assert_eq!(report.measured_operations, 160);
    assert_eq!(measurements.snapshot(Operation::Read).unwrap().count, 160);
    assert!(measurements.status_msg().starts_with("200 operations;"));
}

#[test]
fn test_start_hook_runs_once() {
    let starts = Arc::new(AtomicUsize::new(0));
    let winners = Arc::new(Mutex::new(Vec::new()));
    let gate = {
        let starts = Arc::clone(&starts);
        WarmupGate::new(4, 10, move || {
            starts.fetch_add(1, Ordering::SeqCst);
        })
    };

    std::thread::scope(|s| {
        for i in 0..4 {
            let (gate, winners) = (&gate, &winners);
            s.spawn(move || {
                if gate.arrive_and_wait() {
                    winners.lock().push(i);
                }
            });
        }
    });

    assert_eq!(starts.load(Ordering::SeqCst), 1);
    assert_eq!(winners.lock().len(), 1);
    assert!(gate.is_started());
}

// ============================================================================
// Fatal errors
// ============================================================================

#[test]
fn test_fatal_error_propagates_with_thread() {
    let config = config(3, 30, 0, "basic");
    let measurements = create_measurements(MeasurementType::Basic).unwrap();
    let runner = Runner::new(config, measurements);
    let clock = Arc::new(ManualClock::new());

    let err = runner
        .run_phase(Phase::Run, &Broken, stub(&clock, Status::Ok))
        .unwrap_err();

    match err {
        Error::Worker { thread, source } => {
            assert_eq!(thread, 0);
            assert!(source.to_string().contains("connection reset"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_config_file_round_trip_drives_runner() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.toml");
    config(2, 20, 0, "hdrhistogram").write_to_file(&path).unwrap();

    let loaded = BenchConfig::from_file(&path).unwrap();
    let measurements = create_measurements(loaded.measurement_kind().unwrap()).unwrap();
    let runner = Runner::new(loaded, Arc::clone(&measurements));
    let clock = Arc::new(ManualClock::new());

    let report = runner
        .run_phase_with_clock(Phase::Run, &Reads, stub(&clock, Status::Ok), Arc::clone(&clock))
        .unwrap();
    assert_eq!(report.operations, 20);
    assert_eq!(report.latencies.len(), 1);
    assert_eq!(report.latencies[0].operation, "READ");
}

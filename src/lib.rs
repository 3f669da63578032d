//! strata-bench - concurrent benchmark harness for storage backends
//!
//! strata-bench drives a configurable mix of reads, scans, updates, inserts
//! and deletes against a [`Backend`] from many threads, and aggregates
//! per-operation latency into [`Measurements`].
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use strata_bench::{
//!     create_measurements, shared_memory_store, BenchConfig, CoreWorkload, MemoryBackend,
//!     Phase, Runner,
//! };
//!
//! let config = BenchConfig::default();
//! let measurements = create_measurements(config.measurement_kind()?)?;
//! let workload = CoreWorkload::new(config.workload.clone())?;
//! let runner = Runner::new(config.clone(), Arc::clone(&measurements));
//!
//! let store = shared_memory_store();
//! let report = runner.run_phase(Phase::Load, &workload, |_| {
//!     MemoryBackend::new(Arc::clone(&store), &config.storage)
//! })?;
//! println!("{}", measurements.status_msg());
//! ```
//!
//! # Architecture
//!
//! The [`Runner`] owns the threads, the warm-up boundary and the phase timer.
//! Backends, workloads and measurement strategies plug in through traits
//! re-exported here from the member crates.

pub use strata_bench_concurrency::{CountDownLatch, RateLimiter};
pub use strata_bench_core::{Backend, Error, Field, Generator, Operation, Result, Row, Status, Workload};
pub use strata_bench_engine::{
    BenchConfig, ClientOptions, FatalPolicy, Phase, PhaseReport, Runner, TimedBackend, WarmupGate,
    WarmupTracker,
};
pub use strata_bench_generator::{
    CounterGenerator, RandomAcknowledgedCounterGenerator, RandomCounterGenerator,
};
pub use strata_bench_measurement::{
    create_measurements, BasicMeasurements, Clock, HistogramMeasurements, LatencySnapshot,
    ManualClock, MeasurementType, Measurements, MonotonicClock, Stopwatch,
};
pub use strata_bench_storage::{
    codec_for, shared_memory_store, MemoryBackend, MemoryStore, RowCodec, SharedMemoryStore,
    SharedResource, SingleRowCodec, StorageOptions,
};
pub use strata_bench_workload::{build_key, CoreWorkload, InsertOrder, WorkloadOptions};

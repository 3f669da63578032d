//! Benchmark engine for strata-bench
//!
//! This crate ties the lower layers into runnable phases:
//! - BenchConfig: TOML configuration with validation
//! - TimedBackend: times every backend call into the shared measurements
//! - Worker routines: plain and warm-up variants, plus the WarmupGate
//! - Runner: spawns workers per phase and produces a PhaseReport
//! - Status reporter: periodic progress lines while a phase runs
//!
//! The engine is the only component that knows about:
//! - Splitting a phase's operations across threads
//! - The warm-up boundary and the measurement timer
//! - What a fatal worker error does to the process

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod runner;
pub mod status;
pub mod timed;

pub use client::{run_client, run_client_with_warmup, ClientOptions, Phase, WarmupGate};
pub use config::BenchConfig;
pub use runner::{FatalPolicy, PhaseReport, Runner};
pub use status::{format_status_line, report_status};
pub use timed::{TimedBackend, WarmupTracker};

//! strata-bench: concurrent benchmark driver for the in-memory store.
//!
//! - `strata-bench --load` populates the store
//! - `strata-bench --run` runs the transaction mix
//! - `strata-bench --load --run` does both against the same store
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

mod commands;
mod format;
mod parse;

use std::process;
use std::sync::Arc;

use strata_bench_core::Result;
use strata_bench_engine::{BenchConfig, FatalPolicy, Phase, Runner};
use strata_bench_measurement::create_measurements;
use strata_bench_storage::{shared_memory_store, MemoryBackend};
use strata_bench_workload::CoreWorkload;
use tracing::info;
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{format_all, OutputMode, PhaseOutput};
use parse::{matches_to_config, matches_to_phases};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = build_cli().get_matches();
    let mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let outputs = matches_to_config(&matches)
        .and_then(|config| run(config, &matches_to_phases(&matches)));
    match outputs {
        Ok(outputs) => println!("{}", format_all(&outputs, mode)),
        Err(e) => {
            eprintln!("strata-bench: {}", e);
            process::exit(1);
        }
    }
}

fn run(config: BenchConfig, phases: &[Phase]) -> Result<Vec<PhaseOutput>> {
    let measurements = create_measurements(config.measurement_kind()?)?;
    let workload = CoreWorkload::new(config.workload.clone())?;
    let runner = Runner::new(config.clone(), Arc::clone(&measurements))
        .with_policy(FatalPolicy::Exit);

    // Our lease keeps the loaded rows alive between phases
    let store = shared_memory_store();
    let _held = store.acquire()?;
    let factory = |_: usize| MemoryBackend::new(Arc::clone(&store), &config.storage);

    let mut outputs = Vec::with_capacity(phases.len());
    for &phase in phases {
        measurements.reset();
        let report = runner.run_phase(phase, &workload, factory)?;
        outputs.push(PhaseOutput {
            report,
            status: measurements.status_msg(),
        });
    }

    store.release()?;
    info!(open = store.is_open(), "store released");
    Ok(outputs)
}

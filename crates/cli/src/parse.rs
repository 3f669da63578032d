//! ArgMatches -> BenchConfig and phase list.

use clap::ArgMatches;
use std::path::Path;
use strata_bench_core::Result;
use strata_bench_engine::{BenchConfig, Phase};

/// Load the config file (or defaults), then apply flag overrides and validate.
pub fn matches_to_config(matches: &ArgMatches) -> Result<BenchConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => BenchConfig::from_file(Path::new(path))?,
        None => BenchConfig::default(),
    };

    if let Some(threads) = matches.get_one::<usize>("threads") {
        config.threads = *threads;
    }
    if let Some(target) = matches.get_one::<u64>("target") {
        config.target_ops_per_sec = Some(*target);
    }
    if let Some(kind) = matches.get_one::<String>("measurement") {
        config.measurement_type = kind.clone();
    }
    if let Some(warmup) = matches.get_one::<u64>("warmup") {
        config.warmup_ops = *warmup;
    }
    if let Some(secs) = matches.get_one::<u64>("status-interval") {
        config.status_interval_secs = *secs;
    }

    config.validate()?;
    Ok(config)
}

/// Phases requested on the command line, in execution order.
pub fn matches_to_phases(matches: &ArgMatches) -> Vec<Phase> {
    let mut phases = Vec::with_capacity(2);
    if matches.get_flag("load") {
        phases.push(Phase::Load);
    }
    if matches.get_flag("run") {
        phases.push(Phase::Run);
    }
    phases
}

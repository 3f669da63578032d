//! Benchmark configuration via a TOML file
//!
//! Every key has a default, so an empty file is a valid configuration.
//! Command-line flags override individual keys after the file is loaded;
//! [`BenchConfig::validate`] runs once the final values are known.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use strata_bench_core::{Error, Result};
use strata_bench_measurement::MeasurementType;
use strata_bench_storage::{codec_for, StorageOptions};
use strata_bench_workload::WorkloadOptions;

use crate::client::Phase;

/// Harness configuration loaded from TOML
///
/// # Example
///
/// ```toml
/// threads = 4
/// measurement_type = "hdrhistogram"
/// warmup_ops = 1000
///
/// [workload]
/// record_count = 100000
/// operation_count = 100000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Worker threads per phase
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// `"basic"` or `"hdrhistogram"`
    #[serde(default = "default_measurement_type")]
    pub measurement_type: String,
    /// Warm-up operations across all threads, run phase only
    #[serde(default)]
    pub warmup_ops: u64,
    /// Aggregate operations per second; absent disables throttling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_ops_per_sec: Option<u64>,
    /// Seconds between status lines; 0 disables the reporter
    #[serde(default = "default_status_interval_secs")]
    pub status_interval_secs: u64,
    /// Operation mix
    #[serde(default)]
    pub workload: WorkloadOptions,
    /// Backend options
    #[serde(default)]
    pub storage: StorageOptions,
}

fn default_threads() -> usize {
    1
}

fn default_measurement_type() -> String {
    MeasurementType::DEFAULT_NAME.to_string()
}

fn default_status_interval_secs() -> u64 {
    10
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            measurement_type: default_measurement_type(),
            warmup_ops: 0,
            target_ops_per_sec: None,
            status_interval_secs: default_status_interval_secs(),
            workload: WorkloadOptions::default(),
            storage: StorageOptions::default(),
        }
    }
}

impl BenchConfig {
    /// Default config file content with comments
    pub fn default_toml() -> &'static str {
        r#"# strata-bench configuration

# Worker threads per phase (default: 1)
threads = 1

# Latency aggregation: "basic" (count/min/max/avg) or "hdrhistogram" (adds percentiles)
measurement_type = "basic"

# Warm-up operations across all threads before measurement starts.
# Split evenly per thread; run phase only. 0 disables warm-up.
warmup_ops = 0

# Aggregate throughput cap in operations per second. Omit for no limit.
# target_ops_per_sec = 10000

# Seconds between status lines. 0 disables periodic status.
status_interval_secs = 10

[workload]
table = "usertable"
record_count = 1000
operation_count = 1000
field_count = 10
field_length = 100
read_proportion = 0.95
update_proportion = 0.05
insert_proportion = 0.0
scan_proportion = 0.0
delete_proportion = 0.0
max_scan_length = 100
read_all_fields = true
write_all_fields = false
# "ordered" or "random"
insert_order = "ordered"

[storage]
# Row format: "single"
format = "single"
deserialize_on_read = false
"#
    }

    /// Parse TOML text and validate it
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the text does not parse or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: BenchConfig = toml::from_str(content)
            .map_err(|e| Error::config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: BenchConfig = toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize this config to TOML and write it to `path`
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolve `measurement_type`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown strategy name.
    pub fn measurement_kind(&self) -> Result<MeasurementType> {
        MeasurementType::from_name(&self.measurement_type).ok_or_else(|| {
            Error::config(format!(
                "unknown measurement type '{}'. Expected \"basic\" or \"hdrhistogram\"",
                self.measurement_type
            ))
        })
    }

    /// Total operations for `phase` across all threads
    pub fn phase_ops(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Load => self.workload.record_count,
            Phase::Run => self.workload.operation_count,
        }
    }

    /// Per-thread operation counts for `phase`
    ///
    /// The total is split evenly; the remainder goes to the lowest-numbered
    /// threads.
    pub fn ops_per_thread(&self, phase: Phase) -> Vec<u64> {
        let threads = self.threads.max(1) as u64;
        let total = self.phase_ops(phase);
        let (base, extra) = (total / threads, total % threads);
        (0..threads)
            .map(|i| base + u64::from(i < extra))
            .collect()
    }

    /// Warm-up operations each thread runs before the boundary
    pub fn warmup_per_thread(&self) -> u64 {
        self.warmup_ops / self.threads.max(1) as u64
    }

    /// Warm-up calls expected across all threads
    ///
    /// `warmup_ops` rounded down to a multiple of `threads`.
    pub fn warmup_target(&self) -> u64 {
        self.warmup_per_thread() * self.threads.max(1) as u64
    }

    /// Status reporter period; `None` when disabled
    pub fn status_interval(&self) -> Option<Duration> {
        (self.status_interval_secs > 0).then(|| Duration::from_secs(self.status_interval_secs))
    }

    /// Check every option
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when:
    /// - `threads` is zero
    /// - `measurement_type` or `storage.format` is unknown
    /// - `target_ops_per_sec` is zero
    /// - the workload options are invalid
    /// - warm-up is enabled and some thread has no operations past it
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(Error::config("threads must be >= 1"));
        }
        self.measurement_kind()?;
        if self.target_ops_per_sec == Some(0) {
            return Err(Error::config(
                "target_ops_per_sec must be >= 1; omit it to disable throttling",
            ));
        }
        self.workload.validate()?;
        codec_for(&self.storage.format)?;

        if self.warmup_ops > 0 {
            let warmup = self.warmup_per_thread();
            if let Some(short) = self
                .ops_per_thread(Phase::Run)
                .into_iter()
                .find(|ops| *ops <= warmup)
            {
                return Err(Error::config(format!(
                    "warmup_ops gives {} warm-up operations per thread, \
                     but a thread only runs {} operations",
                    warmup, short
                )));
            }
        }
        Ok(())
    }
}

//! `[workload]` configuration section

use serde::{Deserialize, Serialize};
use strata_bench_core::{Error, Result};

/// Order in which the load phase inserts keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertOrder {
    /// `0, 1, 2, ...`
    Ordered,
    /// A shuffled permutation of `[0, record_count)`
    Random,
}

/// Operation mix and record shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadOptions {
    /// Table every operation targets
    pub table: String,
    /// Rows inserted by the load phase
    pub record_count: u64,
    /// Transactions issued by the run phase
    pub operation_count: u64,
    /// Fields per row
    pub field_count: usize,
    /// Bytes per field value
    pub field_length: usize,
    /// Relative weight of reads
    pub read_proportion: f64,
    /// Relative weight of updates
    pub update_proportion: f64,
    /// Relative weight of inserts
    pub insert_proportion: f64,
    /// Relative weight of scans
    pub scan_proportion: f64,
    /// Relative weight of deletes
    pub delete_proportion: f64,
    /// Upper bound for the uniformly chosen scan length
    pub max_scan_length: usize,
    /// Read every field, or one random field
    pub read_all_fields: bool,
    /// Update every field, or one random field
    pub write_all_fields: bool,
    /// Load-phase key order
    pub insert_order: InsertOrder,
}

impl Default for WorkloadOptions {
    fn default() -> Self {
        Self {
            table: "usertable".to_string(),
            record_count: 1000,
            operation_count: 1000,
            field_count: 10,
            field_length: 100,
            read_proportion: 0.95,
            update_proportion: 0.05,
            insert_proportion: 0.0,
            scan_proportion: 0.0,
            delete_proportion: 0.0,
            max_scan_length: 100,
            read_all_fields: true,
            write_all_fields: false,
            insert_order: InsertOrder::Ordered,
        }
    }
}

impl WorkloadOptions {
    /// Check the options describe a runnable mix
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when:
    /// - a proportion is negative or not finite, or all are zero
    /// - `field_count` is zero
    /// - reads, updates, scans or deletes are enabled with `record_count = 0`
    /// - scans are enabled with `max_scan_length = 0`
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("read_proportion", self.read_proportion),
            ("update_proportion", self.update_proportion),
            ("insert_proportion", self.insert_proportion),
            ("scan_proportion", self.scan_proportion),
            ("delete_proportion", self.delete_proportion),
        ];
        for (name, w) in weights {
            if !w.is_finite() || w < 0.0 {
                return Err(Error::config(format!("{} must be >= 0, got {}", name, w)));
            }
        }
        if weights.iter().all(|(_, w)| *w == 0.0) {
            return Err(Error::config("all operation proportions are zero"));
        }
        if self.field_count == 0 {
            return Err(Error::config("field_count must be >= 1"));
        }
        let touches_existing = self.read_proportion > 0.0
            || self.update_proportion > 0.0
            || self.scan_proportion > 0.0
            || self.delete_proportion > 0.0;
        if touches_existing && self.record_count == 0 {
            return Err(Error::config(
                "record_count must be >= 1 when reads, updates, scans or deletes are enabled",
            ));
        }
        if self.scan_proportion > 0.0 && self.max_scan_length == 0 {
            return Err(Error::config("max_scan_length must be >= 1 when scans are enabled"));
        }
        Ok(())
    }
}

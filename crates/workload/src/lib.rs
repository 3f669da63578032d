//! Workloads for strata-bench
//!
//! - WorkloadOptions: the `[workload]` configuration section
//! - CoreWorkload: weighted read/update/insert/scan/delete mix over one table

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core_workload;
pub mod options;

pub use core_workload::{build_key, CoreWorkload};
pub use options::{InsertOrder, WorkloadOptions};

//! Seams between the harness and its collaborators
//!
//! - [`Backend`]: the storage system under test
//! - [`Workload`]: decides which operation to issue next
//! - [`Generator`]: key sequences shared by all worker threads
//!
//! Thread safety: all three are shared by reference across worker threads,
//! so every method takes `&self` and implementations must be `Send + Sync`.

use crate::error::Result;
use crate::types::{Field, Status};

/// Storage backend driven by the harness
///
/// Data calls return `Ok(status)` for both success and recoverable failure.
/// `Err` is reserved for conditions that invalidate the run.
///
/// `init` and `cleanup` bracket one worker thread's use of the backend.
/// Implementations that share an underlying store across threads are
/// expected to reference-count it.
pub trait Backend: Send + Sync {
    /// Prepare the backend for use by the calling worker
    fn init(&self) -> Result<()>;

    /// Release whatever `init` acquired
    fn cleanup(&self) -> Result<()>;

    /// Read one row; `fields = None` reads all fields
    fn read(
        &self,
        table: &str,
        key: &str,
        fields: Option<&[String]>,
        result: &mut Vec<Field>,
    ) -> Result<Status>;

    /// Read up to `record_count` rows starting at `start_key`
    fn scan(
        &self,
        table: &str,
        start_key: &str,
        record_count: usize,
        fields: Option<&[String]>,
        result: &mut Vec<Vec<Field>>,
    ) -> Result<Status>;

    /// Overwrite the given fields of an existing row
    fn update(&self, table: &str, key: &str, values: &[Field]) -> Result<Status>;

    /// Insert a full row
    fn insert(&self, table: &str, key: &str, values: &[Field]) -> Result<Status>;

    /// Delete a row
    fn delete(&self, table: &str, key: &str) -> Result<Status>;
}

/// Operation mix driven once per worker loop iteration
pub trait Workload: Send + Sync {
    /// Load-phase step: insert the next record
    fn do_insert(&self, db: &dyn Backend) -> Result<()>;

    /// Run-phase step: issue one transaction
    ///
    /// `in_warmup` is true for every iteration before the warm-up boundary.
    fn do_transaction(&self, db: &dyn Backend, in_warmup: bool) -> Result<()>;
}

/// A value sequence consumed concurrently
pub trait Generator<T>: Send + Sync {
    /// Claim the next value
    fn next(&self) -> T;

    /// Most recently claimed value
    fn last(&self) -> T;
}

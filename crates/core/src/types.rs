//! Operation tags, backend status codes and row fields
//!
//! `Operation` is used directly as an index into fixed-size measurement
//! arrays, so its discriminants are dense and start at zero.

use std::fmt;

/// Measured operation kinds
///
/// Failure variants are separate slots rather than a flag on the success
/// variant, so a failed read never contaminates READ latency statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(usize)]
pub enum Operation {
    /// Single-row read
    Read = 0,
    /// Single-row update
    Update = 1,
    /// Single-row insert
    Insert = 2,
    /// Single-row delete
    Delete = 3,
    /// Range scan
    Scan = 4,
    /// Read that returned a non-OK status
    ReadFailed = 5,
    /// Update that returned a non-OK status
    UpdateFailed = 6,
    /// Insert that returned a non-OK status
    InsertFailed = 7,
    /// Delete that returned a non-OK status
    DeleteFailed = 8,
    /// Scan that returned a non-OK status
    ScanFailed = 9,
}

impl Operation {
    /// Number of operation slots
    pub const COUNT: usize = 10;

    /// All operations in index order
    pub const ALL: [Operation; Operation::COUNT] = [
        Operation::Read,
        Operation::Update,
        Operation::Insert,
        Operation::Delete,
        Operation::Scan,
        Operation::ReadFailed,
        Operation::UpdateFailed,
        Operation::InsertFailed,
        Operation::DeleteFailed,
        Operation::ScanFailed,
    ];

    /// Slot index for per-operation arrays
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Display name used in status lines
    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::Read => "READ",
            Operation::Update => "UPDATE",
            Operation::Insert => "INSERT",
            Operation::Delete => "DELETE",
            Operation::Scan => "SCAN",
            Operation::ReadFailed => "READ-FAILED",
            Operation::UpdateFailed => "UPDATE-FAILED",
            Operation::InsertFailed => "INSERT-FAILED",
            Operation::DeleteFailed => "DELETE-FAILED",
            Operation::ScanFailed => "SCAN-FAILED",
        }
    }

    /// True for the `*_FAILED` slots
    pub const fn is_failure(self) -> bool {
        self.index() >= Operation::ReadFailed.index()
    }

    /// The failure slot paired with this operation
    ///
    /// Failure slots map to themselves.
    pub const fn failed(self) -> Operation {
        match self {
            Operation::Read | Operation::ReadFailed => Operation::ReadFailed,
            Operation::Update | Operation::UpdateFailed => Operation::UpdateFailed,
            Operation::Insert | Operation::InsertFailed => Operation::InsertFailed,
            Operation::Delete | Operation::DeleteFailed => Operation::DeleteFailed,
            Operation::Scan | Operation::ScanFailed => Operation::ScanFailed,
        }
    }

    /// Slot to record a call that returned `status`
    #[inline]
    pub fn for_status(self, status: Status) -> Operation {
        if status.is_ok() {
            self
        } else {
            self.failed()
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a backend data call
///
/// Anything other than `Ok` is a recoverable failure: it is measured and the
/// run continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Call succeeded
    Ok,
    /// Backend-reported error
    Error,
    /// Key does not exist
    NotFound,
    /// Backend does not support this call
    NotImplemented,
    /// Malformed request
    BadRequest,
}

impl Status {
    /// True only for [`Status::Ok`]
    #[inline]
    pub fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Ok => "OK",
            Status::Error => "ERROR",
            Status::NotFound => "NOT_FOUND",
            Status::NotImplemented => "NOT_IMPLEMENTED",
            Status::BadRequest => "BAD_REQUEST",
        };
        f.write_str(s)
    }
}

/// A named column value
///
/// The harness passes fields through unmodified; encoding is the backend's
/// concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Column name
    pub name: String,
    /// Raw column bytes
    pub value: Vec<u8>,
}

impl Field {
    /// Create a field
    pub fn new(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An ordered sequence of fields
pub type Row = Vec<Field>;

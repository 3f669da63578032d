//! Error types for the benchmark harness
//!
//! Every error in this enum is fatal to a benchmark run. Recoverable backend
//! failures are not errors: they come back as a non-OK [`Status`] and are
//! recorded in the matching `*_FAILED` measurement slot.
//!
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! [`Status`]: crate::types::Status

use std::io;
use thiserror::Error;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal error conditions for a benchmark run
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unknown configuration value (strategy name, row format, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend failed in a way that invalidates the run
    #[error("Backend error: {0}")]
    Backend(String),

    /// Stored data could not be decoded
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// I/O error (config file, output)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A worker routine failed
    #[error("Worker thread {thread} failed: {source}")]
    Worker {
        /// Index of the failing worker
        thread: usize,
        /// Underlying cause
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Build a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Build a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Error::Backend(msg.into())
    }

    /// Attach the worker index to an error raised inside a worker routine
    pub fn in_worker(self, thread: usize) -> Self {
        match self {
            // Already attributed
            Error::Worker { .. } => self,
            other => Error::Worker {
                thread,
                source: Box::new(other),
            },
        }
    }
}

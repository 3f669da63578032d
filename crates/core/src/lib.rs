//! Core types and traits for strata-bench
//!
//! This crate defines the vocabulary shared by every other harness crate:
//! - Operation: measurement slot tags (success and failure variants)
//! - Status: backend call outcome
//! - Field / Row: column values passed through to the backend
//! - Error: fatal error hierarchy
//! - Traits: Backend, Workload, Generator

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{Backend, Generator, Workload};
pub use types::{Field, Operation, Row, Status};

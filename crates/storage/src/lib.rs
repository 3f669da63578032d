//! Storage backends for strata-bench
//!
//! This crate provides the backend the harness drives out of the box:
//! - SharedResource: reference-counted handle opened on first use, closed on last release
//! - RowCodec: row format chosen once from configuration (`"single"`)
//! - MemoryBackend: ordered in-memory store, one instance per worker thread

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod memory;
pub mod shared;

pub use codec::{codec_for, RowCodec, SingleRowCodec};
pub use memory::{
    shared_memory_store, MemoryBackend, MemoryStore, SharedMemoryStore, StorageOptions,
};
pub use shared::SharedResource;

//! Thread coordination primitives for strata-bench
//!
//! This crate provides the two blocking primitives worker threads use:
//! - CountDownLatch: one-shot gate for "all workers done" and the warm-up boundary
//! - RateLimiter: token bucket shared by all workers to cap aggregate throughput

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod latch;
pub mod rate_limit;

pub use latch::CountDownLatch;
pub use rate_limit::RateLimiter;

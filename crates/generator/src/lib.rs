//! Key sequence generators for strata-bench
//!
//! All generators take `&self` and are shared by every worker thread:
//! - CounterGenerator: sequential, unbounded
//! - RandomCounterGenerator: shuffled finite range, lock-free claim
//! - RandomAcknowledgedCounterGenerator: the above plus durability acknowledgments

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod counter;
pub mod random_acknowledged;
pub mod random_counter;

pub use counter::CounterGenerator;
pub use random_acknowledged::RandomAcknowledgedCounterGenerator;
pub use random_counter::RandomCounterGenerator;
pub use strata_bench_core::Generator;

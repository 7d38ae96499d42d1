//! Batch Resolution Module
//!
//! Resolving many pointers against one document:
//! - Parallel: each pointer on the rayon pool (feature `parallel`)

#[cfg(feature = "parallel")]
pub mod parallel;

#[cfg(feature = "parallel")]
pub use parallel::{resolve_parallel, xpath_map};

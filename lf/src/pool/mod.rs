//! Bounded worker pool
//!
//! Drains an ordered list of keyed jobs with a fixed cap on how many run at
//! once.

mod config;
mod core;

pub use config::PoolConfig;
pub use core::{JobOutcome, PoolReport, PoolStats, WorkerPool};
pub(crate) use core::join_error_reason;

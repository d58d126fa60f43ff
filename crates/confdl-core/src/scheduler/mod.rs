//! Download executor.
//!
//! Session-units are dispatched to a bounded worker pool; inside a unit the
//! tasks run in order with resume-if-present and bounded retry. Per-task
//! results are collected into a [`RunSummary`].

mod outcome;
mod parallel;
mod unit;

pub use outcome::{RunSummary, TaskFailure, TaskOutcome, TaskReport};
pub use parallel::{run_units_parallel, PoolOptions};

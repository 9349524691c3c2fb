//! Execution context for workflow runs.
//!
//! This module provides:
//! - The mutable [`RunContext`] threaded through every step of a run
//! - The append-only metric log accumulated during execution
//! - The [`Adapter`] port trait for external collaborators

mod adapters;
#[cfg(test)]
mod context_tests;
mod metrics;
mod run;

pub use adapters::Adapter;
pub use metrics::{MetricLog, MetricPoint};
pub use run::RunContext;

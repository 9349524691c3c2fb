//! Reusable stage doubles for testing workflows.
//!
//! These are exported so downstream crates can exercise their own workflow
//! definitions with predictable stages: counters, recorders, failures and
//! faults.

mod stages;

pub use stages::{
    CountingStage, FailingStage, PanickingStage, RecordingStage, RejectingStage,
};

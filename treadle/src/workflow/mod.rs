//! Workflow definitions and their compiled form.
//!
//! This module provides:
//! - The flat instruction set and fluent [`WorkflowBuilder`]
//! - The compiled IR node tree interpreted by the runner
//! - The compiler resolving nested block boundaries

mod compiler;
mod definition;
mod ir;

pub use compiler::compile;
pub use definition::{
    Instruction, LoopSource, ParallelLimit, Predicate, WorkflowBuilder, WorkflowDefinition,
};
pub use ir::{ConditionalNode, LoopNode, Node, ParallelNode, StageNode};

//! The compiled intermediate representation interpreted by the runner.

use super::{LoopSource, ParallelLimit, Predicate};
use crate::stages::Stage;
use std::collections::HashMap;
use std::sync::Arc;

/// A compiled executable node.
///
/// Block bodies are themselves fully compiled node sequences; the runner
/// never re-scans start/end markers at run time.
#[derive(Debug, Clone)]
pub enum Node {
    /// A leaf unit of work.
    Stage(StageNode),
    /// A body executed once per produced item.
    Loop(LoopNode),
    /// A body executed zero or one times.
    Conditional(ConditionalNode),
    /// A body declared concurrent (see the runner for actual semantics).
    Parallel(ParallelNode),
}

/// A leaf stage node.
#[derive(Debug, Clone)]
pub struct StageNode {
    /// Workflow-level stage name used in instrumentation and error tagging.
    pub name: String,
    /// The stage implementation.
    pub stage: Arc<dyn Stage>,
    /// Options surfaced to the stage through the context.
    pub opts: HashMap<String, serde_json::Value>,
}

/// A loop node with a compiled body.
#[derive(Debug, Clone)]
pub struct LoopNode {
    /// Loop name; the current item is written to state as `"<name>_current"`.
    pub name: String,
    /// The iteration source.
    pub source: LoopSource,
    /// Body executed once per item.
    pub body: Vec<Node>,
}

impl LoopNode {
    /// Returns the state key the current item is written under.
    #[must_use]
    pub fn current_item_key(&self) -> String {
        format!("{}_current", self.name)
    }
}

/// A conditional node with a compiled body.
#[derive(Debug, Clone)]
pub struct ConditionalNode {
    /// The branch test.
    pub predicate: Predicate,
    /// Body executed when the predicate holds.
    pub body: Vec<Node>,
}

/// A parallel node with a compiled body.
#[derive(Debug, Clone)]
pub struct ParallelNode {
    /// Declared concurrency limit, resolved for bookkeeping.
    pub limit: ParallelLimit,
    /// Body of the block.
    pub body: Vec<Node>,
}

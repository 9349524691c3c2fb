//! The author-facing workflow definition surface.
//!
//! A workflow is declared as a flat, ordered list of primitive instructions.
//! Block instructions (`loop_start`/`loop_end` and friends) delimit nested
//! bodies; the compiler resolves those boundaries into a node tree before
//! execution. Any producer of the instruction shape works — the fluent
//! [`WorkflowBuilder`] is the usual one, but
//! [`WorkflowDefinition::from_instructions`] accepts a pre-built list.

use crate::context::RunContext;
use crate::stages::Stage;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The items a loop iterates over: a literal pre-resolved sequence, or a
/// pure function of the context evaluated when the loop node is reached.
#[derive(Clone)]
pub enum LoopSource {
    /// A literal sequence of items.
    Items(Vec<serde_json::Value>),
    /// A function producing the sequence from the current context.
    Resolve(Arc<dyn Fn(&RunContext) -> Vec<serde_json::Value> + Send + Sync>),
}

impl LoopSource {
    /// Creates a literal source.
    #[must_use]
    pub fn items(items: impl IntoIterator<Item = serde_json::Value>) -> Self {
        Self::Items(items.into_iter().collect())
    }

    /// Creates a context-driven source.
    #[must_use]
    pub fn resolve<F>(f: F) -> Self
    where
        F: Fn(&RunContext) -> Vec<serde_json::Value> + Send + Sync + 'static,
    {
        Self::Resolve(Arc::new(f))
    }

    /// Produces the iteration items for the given context.
    #[must_use]
    pub fn resolve_items(&self, ctx: &RunContext) -> Vec<serde_json::Value> {
        match self {
            Self::Items(items) => items.clone(),
            Self::Resolve(f) => f(ctx),
        }
    }
}

impl fmt::Debug for LoopSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Items(items) => f.debug_tuple("Items").field(&items.len()).finish(),
            Self::Resolve(_) => f.write_str("Resolve(<fn>)"),
        }
    }
}

/// A conditional's branch test: a literal boolean or a pure function of the
/// context.
#[derive(Clone)]
pub enum Predicate {
    /// A literal, pre-resolved decision.
    Literal(bool),
    /// A function evaluated against the current context.
    Test(Arc<dyn Fn(&RunContext) -> bool + Send + Sync>),
}

impl Predicate {
    /// Creates a context-driven predicate.
    #[must_use]
    pub fn test<F>(f: F) -> Self
    where
        F: Fn(&RunContext) -> bool + Send + Sync + 'static,
    {
        Self::Test(Arc::new(f))
    }

    /// Evaluates the predicate for the given context.
    #[must_use]
    pub fn evaluate(&self, ctx: &RunContext) -> bool {
        match self {
            Self::Literal(value) => *value,
            Self::Test(f) => f(ctx),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Test(_) => f.write_str("Test(<fn>)"),
        }
    }
}

/// The concurrency limit declared on a parallel block.
#[derive(Clone)]
pub enum ParallelLimit {
    /// An explicit limit.
    Fixed(usize),
    /// A function resolving the limit from the current context.
    Resolve(Arc<dyn Fn(&RunContext) -> usize + Send + Sync>),
    /// Use the available hardware parallelism.
    Auto,
}

impl ParallelLimit {
    /// Creates a context-driven limit.
    #[must_use]
    pub fn resolve<F>(f: F) -> Self
    where
        F: Fn(&RunContext) -> usize + Send + Sync + 'static,
    {
        Self::Resolve(Arc::new(f))
    }

    /// Resolves the concrete limit for the given context.
    #[must_use]
    pub fn resolve_limit(&self, ctx: &RunContext) -> usize {
        match self {
            Self::Fixed(n) => *n,
            Self::Resolve(f) => f(ctx),
            Self::Auto => std::thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

impl fmt::Debug for ParallelLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(n) => f.debug_tuple("Fixed").field(n).finish(),
            Self::Resolve(_) => f.write_str("Resolve(<fn>)"),
            Self::Auto => f.write_str("Auto"),
        }
    }
}

/// A primitive workflow instruction.
#[derive(Debug, Clone)]
pub enum Instruction {
    /// One unit of work.
    Stage {
        /// Workflow-level stage name.
        name: String,
        /// The stage implementation.
        stage: Arc<dyn Stage>,
        /// Options made visible to the stage via the context.
        opts: HashMap<String, serde_json::Value>,
    },
    /// Opens a loop block.
    LoopStart {
        /// Loop name; also derives the current-item state key.
        name: String,
        /// The iteration source.
        source: LoopSource,
    },
    /// Closes the loop block with the matching name.
    LoopEnd {
        /// Name of the loop being closed.
        name: String,
    },
    /// Opens a conditional block.
    ConditionalStart {
        /// The branch test.
        predicate: Predicate,
    },
    /// Closes the innermost open conditional block.
    ConditionalEnd,
    /// Opens a parallel block.
    ParallelStart {
        /// Declared concurrency limit.
        limit: ParallelLimit,
    },
    /// Closes the innermost open parallel block.
    ParallelEnd,
}

/// A named, ordered workflow definition.
#[derive(Debug, Clone)]
pub struct WorkflowDefinition {
    name: String,
    instructions: Vec<Instruction>,
}

impl WorkflowDefinition {
    /// Creates a definition from a pre-built instruction list.
    #[must_use]
    pub fn from_instructions(name: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        Self {
            name: name.into(),
            instructions,
        }
    }

    /// Returns the workflow name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the instruction list.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }
}

/// Fluent builder producing the flat instruction list.
#[derive(Debug, Clone)]
pub struct WorkflowBuilder {
    name: String,
    instructions: Vec<Instruction>,
}

impl WorkflowBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: Vec::new(),
        }
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage(self, name: impl Into<String>, stage: Arc<dyn Stage>) -> Self {
        self.stage_with_opts(name, stage, HashMap::new())
    }

    /// Appends a stage with options.
    #[must_use]
    pub fn stage_with_opts(
        mut self,
        name: impl Into<String>,
        stage: Arc<dyn Stage>,
        opts: HashMap<String, serde_json::Value>,
    ) -> Self {
        self.instructions.push(Instruction::Stage {
            name: name.into(),
            stage,
            opts,
        });
        self
    }

    /// Opens a loop block.
    #[must_use]
    pub fn loop_over(mut self, name: impl Into<String>, source: LoopSource) -> Self {
        self.instructions.push(Instruction::LoopStart {
            name: name.into(),
            source,
        });
        self
    }

    /// Closes the named loop block.
    #[must_use]
    pub fn end_loop(mut self, name: impl Into<String>) -> Self {
        self.instructions.push(Instruction::LoopEnd { name: name.into() });
        self
    }

    /// Opens a conditional block.
    #[must_use]
    pub fn when(mut self, predicate: Predicate) -> Self {
        self.instructions
            .push(Instruction::ConditionalStart { predicate });
        self
    }

    /// Closes the innermost conditional block.
    #[must_use]
    pub fn end_when(mut self) -> Self {
        self.instructions.push(Instruction::ConditionalEnd);
        self
    }

    /// Opens a parallel block.
    #[must_use]
    pub fn parallel(mut self, limit: ParallelLimit) -> Self {
        self.instructions.push(Instruction::ParallelStart { limit });
        self
    }

    /// Closes the innermost parallel block.
    #[must_use]
    pub fn end_parallel(mut self) -> Self {
        self.instructions.push(Instruction::ParallelEnd);
        self
    }

    /// Returns the number of instructions recorded so far.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Finishes the definition.
    #[must_use]
    pub fn build(self) -> WorkflowDefinition {
        WorkflowDefinition {
            name: self.name,
            instructions: self.instructions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::NoOpStage;
    use serde_json::json;

    fn noop(id: &str) -> Arc<dyn Stage> {
        Arc::new(NoOpStage::new(id))
    }

    #[test]
    fn test_builder_records_instructions_in_order() {
        let workflow = WorkflowBuilder::new("train")
            .stage("load", noop("load"))
            .loop_over("epochs", LoopSource::items([json!(1), json!(2)]))
            .stage("step", noop("step"))
            .end_loop("epochs")
            .build();

        assert_eq!(workflow.name(), "train");
        assert_eq!(workflow.instructions().len(), 4);
        assert!(matches!(
            workflow.instructions()[1],
            Instruction::LoopStart { .. }
        ));
        assert!(matches!(
            workflow.instructions()[3],
            Instruction::LoopEnd { .. }
        ));
    }

    #[test]
    fn test_loop_source_resolution() {
        let ctx = RunContext::new().with_state("n", json!(2));

        let literal = LoopSource::items([json!("a"), json!("b")]);
        assert_eq!(literal.resolve_items(&ctx), vec![json!("a"), json!("b")]);

        let derived = LoopSource::resolve(|ctx| {
            let n = ctx.state("n").and_then(serde_json::Value::as_u64).unwrap_or(0);
            (0..n).map(|i| json!(i)).collect()
        });
        assert_eq!(derived.resolve_items(&ctx), vec![json!(0), json!(1)]);
    }

    #[test]
    fn test_predicate_evaluation() {
        let ctx = RunContext::new().with_state("ready", json!(true));

        assert!(Predicate::Literal(true).evaluate(&ctx));
        assert!(!Predicate::Literal(false).evaluate(&ctx));

        let test = Predicate::test(|ctx| {
            ctx.state("ready").and_then(serde_json::Value::as_bool) == Some(true)
        });
        assert!(test.evaluate(&ctx));
    }

    #[test]
    fn test_parallel_limit_resolution() {
        let ctx = RunContext::new().with_config("workers", json!(3));

        assert_eq!(ParallelLimit::Fixed(4).resolve_limit(&ctx), 4);
        assert!(ParallelLimit::Auto.resolve_limit(&ctx) >= 1);

        let derived = ParallelLimit::resolve(|ctx| {
            ctx.config("workers")
                .and_then(serde_json::Value::as_u64)
                .map_or(1, |n| usize::try_from(n).unwrap_or(1))
        });
        assert_eq!(derived.resolve_limit(&ctx), 3);
    }
}

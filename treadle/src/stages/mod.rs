//! Stage trait and implementations.
//!
//! Stages are the pluggable units of work a workflow sequences. The trait
//! is a capability set: `execute` is mandatory, `validate` and `rollback`
//! are opt-in with always-passing / pass-through defaults.

use crate::context::RunContext;
use crate::errors::{FaultInfo, StageError};
use async_trait::async_trait;
use std::fmt::Debug;

/// Trait for workflow stages.
///
/// A stage consumes the run context and returns an updated one, or a
/// [`StageError`] for an anticipated failure. A panic inside `execute` is a
/// fault, not an error: the runner routes it through `rollback` when
/// [`has_rollback`](Stage::has_rollback) is true and lets it unwind
/// otherwise.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns a stable implementation identifier used in instrumentation.
    /// The workflow-level stage *name* is declared on the instruction, not
    /// here; one implementation may back several named stages.
    fn id(&self) -> &str;

    /// Checks preconditions before any work begins.
    ///
    /// A rejection fails the stage without `execute` being called.
    async fn validate(&self, _ctx: &RunContext) -> Result<(), StageError> {
        Ok(())
    }

    /// Performs the unit of work.
    async fn execute(&self, ctx: RunContext) -> Result<RunContext, StageError>;

    /// Whether this stage opts into fault recovery via [`rollback`](Stage::rollback).
    fn has_rollback(&self) -> bool {
        false
    }

    /// Recovers a context after an unexpected fault in `execute`.
    ///
    /// Receives the context as it was immediately before `execute` ran. Only
    /// invoked when [`has_rollback`](Stage::has_rollback) returns true.
    async fn rollback(&self, ctx: RunContext, _fault: &FaultInfo) -> RunContext {
        ctx
    }
}

/// A function-based stage.
pub struct FnStage<F>
where
    F: Fn(RunContext) -> Result<RunContext, StageError> + Send + Sync,
{
    id: String,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(RunContext) -> Result<RunContext, StageError> + Send + Sync,
{
    /// Creates a new function-based stage.
    pub fn new(id: impl Into<String>, func: F) -> Self {
        Self {
            id: id.into(),
            func,
        }
    }
}

impl<F> Debug for FnStage<F>
where
    F: Fn(RunContext) -> Result<RunContext, StageError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage").field("id", &self.id).finish()
    }
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: Fn(RunContext) -> Result<RunContext, StageError> + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, ctx: RunContext) -> Result<RunContext, StageError> {
        (self.func)(ctx)
    }
}

/// A stage that does nothing and succeeds.
#[derive(Debug, Clone)]
pub struct NoOpStage {
    id: String,
}

impl NoOpStage {
    /// Creates a new no-op stage.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl Stage for NoOpStage {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, ctx: RunContext) -> Result<RunContext, StageError> {
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fn_stage() {
        let stage = FnStage::new("incr", |mut ctx: RunContext| {
            let count = ctx.state("count").and_then(serde_json::Value::as_i64).unwrap_or(0);
            ctx.put_state("count", json!(count + 1));
            Ok(ctx)
        });

        assert_eq!(stage.id(), "incr");

        let ctx = RunContext::new().with_state("count", json!(2));
        let ctx = stage.execute(ctx).await.unwrap();
        assert_eq!(ctx.state("count"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn test_default_validate_passes() {
        let stage = NoOpStage::new("noop");
        let ctx = RunContext::new();

        assert!(stage.validate(&ctx).await.is_ok());
        assert!(!stage.has_rollback());
    }

    #[tokio::test]
    async fn test_noop_stage_returns_context_unchanged() {
        let stage = NoOpStage::new("noop");
        let ctx = RunContext::new().with_state("k", json!("v"));

        let ctx = stage.execute(ctx).await.unwrap();
        assert_eq!(ctx.state("k"), Some(&json!("v")));
    }
}

//! The workflow interpreter.
//!
//! [`Runner::run`] compiles a definition once, then walks the node tree
//! depth-first against the run context: strictly in order, short-circuiting
//! on the first failure, emitting lifecycle events around every stage.
//!
//! Failure tiers: a `validate` rejection or an `execute` error return halts
//! the run with a structured [`WorkflowError`]. A panic inside `execute` is
//! a fault — caught and annotated through the stage's rollback hook when one
//! is declared, otherwise resumed past the runner so the run aborts
//! abnormally. The runner never retries anything.


use crate::context::RunContext;
use crate::errors::{panic_message, FaultInfo, WorkflowError};
use crate::events::{EventSink, LoggingEventSink};
use crate::workflow::{
    compile, ConditionalNode, LoopNode, Node, ParallelNode, StageNode, WorkflowDefinition,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::json;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

/// Executes compiled workflows against a run context.
pub struct Runner {
    sink: Arc<dyn EventSink>,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// Creates a runner that logs lifecycle events via `tracing`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sink: Arc::new(LoggingEventSink::default()),
        }
    }

    /// Creates a runner emitting lifecycle events into the given sink.
    #[must_use]
    pub fn with_sink(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Compiles and runs a workflow definition.
    ///
    /// Returns the final context on success, or the first failure
    /// encountered. A faulting stage without a rollback hook does not return
    /// at all: its panic resumes past this call.
    pub async fn run(
        &self,
        definition: &WorkflowDefinition,
        ctx: RunContext,
    ) -> Result<RunContext, WorkflowError> {
        let nodes = compile(definition)?;

        self.sink.try_emit(
            "workflow.started",
            Some(json!({
                "workflow": definition.name(),
                "run_id": ctx.run_id().to_string(),
            })),
        );

        let start = Instant::now();
        match self.execute_nodes(&nodes, ctx).await {
            Ok(ctx) => {
                self.sink.try_emit(
                    "workflow.completed",
                    Some(json!({
                        "workflow": definition.name(),
                        "success": true,
                        "duration_ms": duration_ms(start),
                    })),
                );
                Ok(ctx)
            }
            Err(err) => {
                self.sink.try_emit(
                    "workflow.failed",
                    Some(json!({
                        "workflow": definition.name(),
                        "success": false,
                        "stage": err.stage(),
                        "error": err.to_string(),
                        "duration_ms": duration_ms(start),
                    })),
                );
                Err(err)
            }
        }
    }

    /// Executes a compiled node sequence in order.
    ///
    /// An empty sequence returns the context unchanged. A later node never
    /// starts before the previous one has returned successfully; the first
    /// failure aborts the remainder.
    pub fn execute_nodes<'a>(
        &'a self,
        nodes: &'a [Node],
        ctx: RunContext,
    ) -> BoxFuture<'a, Result<RunContext, WorkflowError>> {
        async move {
            let mut ctx = ctx;
            for node in nodes {
                ctx = match node {
                    Node::Stage(stage) => self.execute_stage(stage, ctx).await?,
                    Node::Loop(loop_node) => self.execute_loop(loop_node, ctx).await?,
                    Node::Conditional(cond) => self.execute_conditional(cond, ctx).await?,
                    Node::Parallel(par) => self.execute_parallel(par, ctx).await?,
                };
            }
            Ok(ctx)
        }
        .boxed()
    }

    async fn execute_stage(
        &self,
        node: &StageNode,
        mut ctx: RunContext,
    ) -> Result<RunContext, WorkflowError> {
        ctx.set_current_stage(&node.name, node.opts.clone());

        self.sink.try_emit(
            "stage.started",
            Some(json!({
                "stage": node.name,
                "impl": node.stage.id(),
            })),
        );
        let start = Instant::now();

        if let Err(source) = node.stage.validate(&ctx).await {
            self.sink.try_emit(
                "stage.failed",
                Some(json!({
                    "stage": node.name,
                    "impl": node.stage.id(),
                    "success": false,
                    "phase": "validate",
                    "error": source.to_string(),
                })),
            );
            return Err(WorkflowError::Validation {
                stage: node.name.clone(),
                source,
            });
        }

        // Snapshot the pre-execute context only when the stage can actually
        // use it for fault recovery.
        let saved = if node.stage.has_rollback() {
            Some(ctx.clone())
        } else {
            None
        };

        match AssertUnwindSafe(node.stage.execute(ctx)).catch_unwind().await {
            Ok(Ok(next)) => {
                self.sink.try_emit(
                    "stage.completed",
                    Some(json!({
                        "stage": node.name,
                        "impl": node.stage.id(),
                        "success": true,
                        "duration_ms": duration_ms(start),
                    })),
                );
                Ok(next)
            }
            Ok(Err(source)) => {
                self.sink.try_emit(
                    "stage.failed",
                    Some(json!({
                        "stage": node.name,
                        "impl": node.stage.id(),
                        "success": false,
                        "phase": "execute",
                        "error": source.to_string(),
                        "payload": source.payload.clone(),
                    })),
                );
                Err(WorkflowError::Stage {
                    stage: node.name.clone(),
                    source,
                })
            }
            Err(payload) => match saved {
                Some(saved) => {
                    let fault = FaultInfo::new(panic_message(payload.as_ref()));
                    let restored = node.stage.rollback(saved, &fault).await;
                    self.sink.try_emit(
                        "stage.exception",
                        Some(json!({
                            "stage": node.name,
                            "impl": node.stage.id(),
                            "success": false,
                            "error": fault.message.clone(),
                        })),
                    );
                    Err(WorkflowError::Fault {
                        stage: node.name.clone(),
                        message: fault.message,
                        context: Box::new(restored),
                    })
                }
                // No rollback hook: the fault stays a fault. Let it unwind
                // past the runner boundary.
                None => std::panic::resume_unwind(payload),
            },
        }
    }

    async fn execute_loop(
        &self,
        node: &LoopNode,
        mut ctx: RunContext,
    ) -> Result<RunContext, WorkflowError> {
        let items = node.source.resolve_items(&ctx);
        let key = node.current_item_key();

        for item in items {
            ctx.put_state(key.clone(), item);
            ctx = self.execute_nodes(&node.body, ctx).await?;
        }

        Ok(ctx)
    }

    async fn execute_conditional(
        &self,
        node: &ConditionalNode,
        ctx: RunContext,
    ) -> Result<RunContext, WorkflowError> {
        if node.predicate.evaluate(&ctx) {
            self.execute_nodes(&node.body, ctx).await
        } else {
            Ok(ctx)
        }
    }

    /// Runs a parallel block.
    ///
    /// The declared concurrency limit is resolved and reported for
    /// bookkeeping, but the body executes sequentially in declared order:
    /// genuine fan-out needs per-branch context isolation and a merge rule
    /// the engine does not define yet, and existing workflows rely on
    /// sequential side-effect ordering.
    async fn execute_parallel(
        &self,
        node: &ParallelNode,
        ctx: RunContext,
    ) -> Result<RunContext, WorkflowError> {
        let limit = node.limit.resolve_limit(&ctx);
        self.sink.try_emit(
            "parallel.entered",
            Some(json!({
                "max_concurrency": limit,
                "branches": node.body.len(),
            })),
        );

        let result = self.execute_nodes(&node.body, ctx).await;

        self.sink.try_emit(
            "parallel.exited",
            Some(json!({
                "success": result.is_ok(),
            })),
        );

        result
    }
}

fn duration_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

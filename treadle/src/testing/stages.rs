//! Stage doubles with predictable behavior.

use crate::context::RunContext;
use crate::errors::{FaultInfo, StageError};
use crate::stages::Stage;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

/// Increments an integer state entry by one on each execution.
#[derive(Debug, Clone)]
pub struct CountingStage {
    id: String,
    key: String,
}

impl CountingStage {
    /// Creates a counting stage incrementing `state[key]`.
    #[must_use]
    pub fn new(id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
        }
    }
}

#[async_trait]
impl Stage for CountingStage {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, mut ctx: RunContext) -> Result<RunContext, StageError> {
        let count = ctx
            .state(&self.key)
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(0);
        ctx.put_state(self.key.clone(), json!(count + 1));
        Ok(ctx)
    }
}

/// Appends an entry to a shared log each time it executes. The log doubles
/// as a side-effect counter for asserting which stages actually ran.
#[derive(Debug, Clone)]
pub struct RecordingStage {
    id: String,
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingStage {
    /// Creates a recording stage writing into the shared log.
    #[must_use]
    pub fn new(id: impl Into<String>, log: Arc<Mutex<Vec<String>>>) -> Self {
        Self { id: id.into(), log }
    }
}

#[async_trait]
impl Stage for RecordingStage {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, ctx: RunContext) -> Result<RunContext, StageError> {
        self.log.lock().push(self.id.clone());
        Ok(ctx)
    }
}

/// Returns a stage error from `execute`.
#[derive(Debug, Clone)]
pub struct FailingStage {
    id: String,
    reason: String,
}

impl FailingStage {
    /// Creates a failing stage.
    #[must_use]
    pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Stage for FailingStage {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, _ctx: RunContext) -> Result<RunContext, StageError> {
        Err(StageError::new(self.reason.clone()))
    }
}

/// Rejects the context from `validate`; `execute` records that it was
/// (incorrectly) reached before succeeding.
#[derive(Debug, Clone)]
pub struct RejectingStage {
    id: String,
    reason: String,
    executed: Arc<Mutex<bool>>,
}

impl RejectingStage {
    /// Creates a stage whose `validate` always rejects.
    #[must_use]
    pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
            executed: Arc::new(Mutex::new(false)),
        }
    }

    /// Whether `execute` was ever called.
    #[must_use]
    pub fn was_executed(&self) -> bool {
        *self.executed.lock()
    }
}

#[async_trait]
impl Stage for RejectingStage {
    fn id(&self) -> &str {
        &self.id
    }

    async fn validate(&self, _ctx: &RunContext) -> Result<(), StageError> {
        Err(StageError::new(self.reason.clone()))
    }

    async fn execute(&self, ctx: RunContext) -> Result<RunContext, StageError> {
        *self.executed.lock() = true;
        Ok(ctx)
    }
}

/// Panics from `execute`, optionally declaring a rollback hook that marks
/// the context before handing it back.
#[derive(Debug, Clone)]
pub struct PanickingStage {
    id: String,
    message: String,
    with_rollback: bool,
}

impl PanickingStage {
    /// Creates a panicking stage without a rollback hook.
    #[must_use]
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            with_rollback: false,
        }
    }

    /// Declares the rollback hook. On a fault the hook writes the fault
    /// message under `state["rolled_back"]`.
    #[must_use]
    pub fn with_rollback(mut self) -> Self {
        self.with_rollback = true;
        self
    }
}

#[async_trait]
impl Stage for PanickingStage {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, _ctx: RunContext) -> Result<RunContext, StageError> {
        panic!("{}", self.message);
    }

    fn has_rollback(&self) -> bool {
        self.with_rollback
    }

    async fn rollback(&self, mut ctx: RunContext, fault: &FaultInfo) -> RunContext {
        ctx.put_state("rolled_back", json!(fault.message));
        ctx
    }
}

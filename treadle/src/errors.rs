//! Error types for the treadle engine.
//!
//! Two failure tiers exist. Anticipated failures (validation rejections,
//! stage errors) are ordinary values: [`StageError`] from a stage,
//! [`WorkflowError`] from the runner. Unexpected faults are panics; the
//! runner catches one only when the faulting stage defines a rollback hook,
//! in which case it surfaces as [`WorkflowError::Fault`] carrying the
//! rolled-back context. Without a rollback hook the panic resumes past the
//! runner boundary.

use crate::context::RunContext;
use thiserror::Error;

/// The error value a stage returns from `execute` or `validate`.
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct StageError {
    /// Human-readable failure reason.
    pub reason: String,
    /// Optional structured payload describing the failure.
    pub payload: Option<serde_json::Value>,
}

impl StageError {
    /// Creates a new stage error.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            payload: None,
        }
    }

    /// Attaches a structured payload.
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Information about a caught fault, handed to a stage's rollback hook.
#[derive(Debug, Clone)]
pub struct FaultInfo {
    /// The panic message, when one could be extracted from the payload.
    pub message: String,
}

impl FaultInfo {
    /// Creates fault info from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Extracts a printable message from a panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Structural errors raised while compiling a workflow definition.
///
/// Block markers must pair exactly: every open block needs a matching end
/// marker at the same nesting depth, and a `loop_end` must name the loop it
/// closes. Unclosed blocks at end of definition are rejected rather than
/// implicitly closed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    /// A `loop_end` named a loop other than the innermost open one.
    #[error("loop_end '{found}' does not match open loop '{expected}'")]
    LoopNameMismatch {
        /// The name of the innermost open loop.
        expected: String,
        /// The name carried by the end marker.
        found: String,
    },

    /// An end marker tried to close a block of a different kind.
    #[error("'{marker}' cannot close the open {open} block")]
    MismatchedEnd {
        /// The offending end marker.
        marker: &'static str,
        /// The kind of block actually open.
        open: &'static str,
    },

    /// An end marker appeared with no block open at all.
    #[error("'{marker}' has no open block to close")]
    StrayEnd {
        /// The offending end marker.
        marker: &'static str,
    },

    /// A block was still open when the definition ended.
    #[error("unclosed {kind} block{} at end of definition", .name.as_ref().map(|n| format!(" '{n}'")).unwrap_or_default())]
    UnclosedBlock {
        /// The kind of block left open.
        kind: &'static str,
        /// The block name, for loops.
        name: Option<String>,
    },
}

/// The failure type returned by the runner.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The workflow definition was structurally malformed.
    #[error("{0}")]
    Structure(#[from] StructureError),

    /// A stage's `validate` rejected the context; `execute` never ran.
    #[error("stage '{stage}' failed validation: {source}")]
    Validation {
        /// The workflow-level stage name.
        stage: String,
        /// The rejection returned by `validate`.
        source: StageError,
    },

    /// A stage's `execute` returned an error value.
    #[error("stage '{stage}' failed: {source}")]
    Stage {
        /// The workflow-level stage name.
        stage: String,
        /// The error returned by `execute`.
        source: StageError,
    },

    /// A stage panicked and its rollback hook produced an annotated context.
    #[error("stage '{stage}' faulted: {message}")]
    Fault {
        /// The workflow-level stage name.
        stage: String,
        /// The extracted panic message.
        message: String,
        /// The context returned by the stage's rollback hook.
        context: Box<RunContext>,
    },
}

impl WorkflowError {
    /// Returns the name of the stage the failure is attributed to, if any.
    #[must_use]
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::Structure(_) => None,
            Self::Validation { stage, .. }
            | Self::Stage { stage, .. }
            | Self::Fault { stage, .. } => Some(stage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_display() {
        let err = StageError::new("boom").with_payload(serde_json::json!({"code": 7}));
        assert_eq!(err.to_string(), "boom");
        assert!(err.payload.is_some());
    }

    #[test]
    fn test_structure_error_display() {
        let err = StructureError::LoopNameMismatch {
            expected: "outer".to_string(),
            found: "inner".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "loop_end 'inner' does not match open loop 'outer'"
        );

        let err = StructureError::UnclosedBlock {
            kind: "loop",
            name: Some("epochs".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "unclosed loop block 'epochs' at end of definition"
        );

        let err = StructureError::UnclosedBlock {
            kind: "conditional",
            name: None,
        };
        assert_eq!(
            err.to_string(),
            "unclosed conditional block at end of definition"
        );
    }

    #[test]
    fn test_workflow_error_stage_attribution() {
        let err = WorkflowError::Stage {
            stage: "load".to_string(),
            source: StageError::new("boom"),
        };
        assert_eq!(err.stage(), Some("load"));
        assert_eq!(err.to_string(), "stage 'load' failed: boom");

        let err = WorkflowError::Structure(StructureError::StrayEnd { marker: "loop_end" });
        assert_eq!(err.stage(), None);
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn std::any::Any + Send> = Box::new("owned".to_string());
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn std::any::Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}

//! Typed error hierarchy for the draftsmith pipeline.
//!
//! Two enums cover the two failure domains:
//! - `PipelineError`: everything the orchestrator can surface to a caller
//! - `GenerationError`: failures at the external model boundary
//!
//! Every pipeline failure names the run, the attempted operation, and the
//! specific cause, so the CLI and HTTP surfaces can report it verbatim.

use thiserror::Error;

use crate::models::Platform;
use crate::state::{Operation, RunStatus};

/// Errors surfaced by pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad input. Local, never retried, reported with the offending field.
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// A state-machine precondition failed. Checked before any model call.
    #[error("run {run_id}: cannot {operation} while status is {status}")]
    OperationNotPermitted {
        run_id: String,
        operation: Operation,
        status: RunStatus,
    },

    /// A status edge outside the state machine was attempted.
    #[error("run {run_id}: invalid status transition {from} -> {to}")]
    InvalidStatusChange {
        run_id: String,
        from: RunStatus,
        to: RunStatus,
    },

    #[error("run not found: {0}")]
    RunNotFound(String),

    #[error("run {run_id}: artifact not found: {name}")]
    ArtifactNotFound { run_id: String, name: String },

    #[error("run {run_id}: no {platform} draft to patch; render one first")]
    NoCurrentDraft { run_id: String, platform: Platform },

    /// The model call failed or returned an unusable payload.
    #[error("run {run_id}: {operation} failed: {source}")]
    Generation {
        run_id: String,
        operation: Operation,
        #[source]
        source: GenerationError,
    },

    /// A bundled or overridden resource could not be resolved.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// Underlying storage failure. Always fatal to the current operation.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Failure kinds at the external model boundary.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("model call timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("provider error: {0}")]
    Provider(String),

    #[error("model returned schema-invalid output: {0}")]
    InvalidSchema(String),
}

impl GenerationError {
    /// Transient failures may be retried once by the orchestrator.
    /// Schema-invalid output is a prompt/schema defect and never retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Provider(_))
    }
}

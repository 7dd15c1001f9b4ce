//! The run state machine.
//!
//! A run moves through `created -> brief_saved -> core_generated -> rendered
//! -> patched`, with `awaiting_clarification` as the only non-monotonic state
//! (it loops back to `core_generated` once a clarification answer lands, or
//! stays pending indefinitely). There are no terminal states: a run can always
//! be re-rendered or re-patched.
//!
//! Two pure checks drive everything:
//! - [`permitted`] gates an operation *before* any model call is attempted
//! - [`transition_allowed`] validates a concrete status edge before it is
//!   persisted
//!
//! Both are plain matches over (status, input); there is no traversal engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Run-level lifecycle status, persisted in `meta.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Created,
    BriefSaved,
    CoreGenerated,
    AwaitingClarification,
    Rendered,
    Patched,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Created => "created",
            RunStatus::BriefSaved => "brief_saved",
            RunStatus::CoreGenerated => "core_generated",
            RunStatus::AwaitingClarification => "awaiting_clarification",
            RunStatus::Rendered => "rendered",
            RunStatus::Patched => "patched",
        }
    }

    /// Compute the status a successful stage lands the run in.
    ///
    /// Re-running a stage the run is already past keeps the current status;
    /// the caller still refreshes `updated_at`.
    pub fn after(self, event: StageEvent) -> RunStatus {
        use RunStatus::*;
        match (self, event) {
            (Created, StageEvent::BriefPersisted) => BriefSaved,

            (BriefSaved | CoreGenerated | AwaitingClarification, StageEvent::ClarificationRequested) => {
                AwaitingClarification
            }

            (BriefSaved | AwaitingClarification, StageEvent::CoreSynthesized) => CoreGenerated,

            (CoreGenerated, StageEvent::DraftRendered) => Rendered,

            (Rendered, StageEvent::DraftPatched) => Patched,

            // Idempotent re-runs of an earlier stage keep the current status.
            (current, _) => current,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "created" => Ok(RunStatus::Created),
            "brief_saved" => Ok(RunStatus::BriefSaved),
            "core_generated" => Ok(RunStatus::CoreGenerated),
            "awaiting_clarification" => Ok(RunStatus::AwaitingClarification),
            "rendered" => Ok(RunStatus::Rendered),
            "patched" => Ok(RunStatus::Patched),
            other => Err(format!(
                "unknown status '{other}'; valid statuses: created, brief_saved, \
                 core_generated, awaiting_clarification, rendered, patched"
            )),
        }
    }
}

/// Pipeline operations a caller can request. Each maps 1:1 to an orchestrator
/// entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SaveBrief,
    GenerateCore,
    Clarify,
    Render,
    Patch,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::SaveBrief => "save brief",
            Operation::GenerateCore => "generate core",
            Operation::Clarify => "apply clarification",
            Operation::Render => "render",
            Operation::Patch => "patch",
        })
    }
}

/// Successful stage completions that move the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageEvent {
    BriefPersisted,
    ClarificationRequested,
    CoreSynthesized,
    DraftRendered,
    DraftPatched,
}

/// Is `operation` allowed while the run sits in `status`?
///
/// This is the precondition test the orchestrator runs before touching the
/// model, so ordering violations fail without a paid call.
pub fn permitted(status: RunStatus, operation: Operation) -> bool {
    use RunStatus::*;
    match (status, operation) {
        (Created, Operation::SaveBrief) => true,

        // Synthesis needs a persisted brief; re-synthesis from any later
        // state overwrites the core. From awaiting_clarification this is the
        // retry leg of the clarification loop.
        (
            BriefSaved | CoreGenerated | AwaitingClarification | Rendered | Patched,
            Operation::GenerateCore,
        ) => true,

        // Answers only make sense while a question is pending.
        (AwaitingClarification, Operation::Clarify) => true,

        (CoreGenerated | Rendered | Patched, Operation::Render) => true,

        (Rendered | Patched, Operation::Patch) => true,

        _ => false,
    }
}

/// Is the concrete status edge `from -> to` part of the state machine?
/// Self-edges are always allowed (idempotent re-runs refresh `updated_at`).
pub fn transition_allowed(from: RunStatus, to: RunStatus) -> bool {
    use RunStatus::*;
    if from == to {
        return true;
    }
    matches!(
        (from, to),
        (Created, BriefSaved)
            | (BriefSaved, CoreGenerated)
            | (BriefSaved, AwaitingClarification)
            | (CoreGenerated, AwaitingClarification)
            | (AwaitingClarification, CoreGenerated)
            | (CoreGenerated, Rendered)
            | (Rendered, Patched)
    )
}

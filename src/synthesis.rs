//! Core synthesis: brief -> clarify verdict -> content core.
//!
//! Pure transformation steps over an [`LmProvider`]; all persistence and
//! status handling stays in the orchestrator.

use crate::errors::GenerationError;
use crate::llm::{self, LmProvider};
use crate::models::{Brief, ClarificationResult, ContentCore};
use crate::resources::{StyleProfile, fill_template};

/// Render the brief the way prompts consume it.
///
/// An explicit "no context" marker beats an empty section: it tells the model
/// not to invent facts and gives the clarify pass something to react to.
pub fn brief_summary(brief: &Brief) -> String {
    let mut lines = vec![
        format!("Topic: {}", brief.topic),
        format!("Goal: {}", brief.goal),
        format!("Audience: {}", brief.audience),
        format!("Language: {}", brief.language),
        format!(
            "Platforms: {}",
            brief
                .platform_targets
                .iter()
                .map(|p| p.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    ];
    match &brief.context_notes {
        Some(notes) => lines.push(format!("Context / sources: {notes}")),
        None => lines.push(
            "Context / sources: NONE PROVIDED. Do NOT invent specific facts or statistics."
                .to_string(),
        ),
    }
    if !brief.constraints.is_empty() {
        lines.push("Constraints:".to_string());
        for (key, value) in &brief.constraints {
            lines.push(format!("  {key}: {value}"));
        }
    }
    lines.join("\n")
}

/// Ask the model whether the brief is specific enough to synthesize from.
/// The verdict is entirely model-reported; no heuristic runs here.
pub async fn evaluate_clarity(
    provider: &dyn LmProvider,
    template: &str,
    brief: &Brief,
) -> Result<ClarificationResult, GenerationError> {
    llm::generate_structured(provider, template, &brief_summary(brief)).await
}

/// A synthesized core plus the exact system prompt that produced it.
#[derive(Debug)]
pub struct SynthesisOutcome {
    pub core: ContentCore,
    pub system_prompt: String,
}

/// Synthesize a [`ContentCore`] from the brief. The parsed payload is checked
/// against the core invariants; a violation counts as schema-invalid output.
pub async fn synthesize(
    provider: &dyn LmProvider,
    template: &str,
    style: &StyleProfile,
    brief: &Brief,
) -> Result<SynthesisOutcome, GenerationError> {
    let system = fill_template(template, &[("forbidden_phrases", &style.forbidden_block())]);
    let core: ContentCore = llm::generate_structured(provider, &system, &brief_summary(brief)).await?;
    core.validate().map_err(GenerationError::InvalidSchema)?;
    Ok(SynthesisOutcome {
        core,
        system_prompt: system,
    })
}

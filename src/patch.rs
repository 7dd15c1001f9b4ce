//! Patch engine: directive + current draft body -> revised body + changelog.
//!
//! The model returns the full revised draft followed by a `---CHANGELOG---`
//! separator and a summary of what changed. Versioning and changelog
//! persistence live in the orchestrator; this module is the pure transform.

use crate::errors::GenerationError;
use crate::llm::LmProvider;
use crate::resources::{StyleProfile, fill_template};

pub const CHANGELOG_SEPARATOR: &str = "---CHANGELOG---";

#[derive(Debug)]
pub struct PatchOutcome {
    pub body: String,
    /// Model-written summary of the edit; empty when the separator was absent.
    pub changelog: String,
    /// Advisory warnings (forbidden phrases) on the revised body.
    pub warnings: Vec<String>,
    /// Exact system prompt sent to the model, kept for auditability.
    pub system_prompt: String,
}

/// Apply a directive to the current draft body.
pub async fn apply(
    provider: &dyn LmProvider,
    template: &str,
    style: &StyleProfile,
    current_body: &str,
    directive: &str,
) -> Result<PatchOutcome, GenerationError> {
    let system_prompt = fill_template(
        template,
        &[
            ("forbidden_phrases", &style.forbidden_block()),
            ("voice_rules", &style.voice_rules()),
            ("draft", current_body),
            ("directive", directive),
        ],
    );

    let raw = provider.generate(&system_prompt, "Apply the patch now.").await?;
    let (body, changelog) = split_changelog(&raw);
    if body.is_empty() {
        return Err(GenerationError::InvalidSchema(
            "model returned an empty patched draft".into(),
        ));
    }

    let found = style.forbidden_in(&body);
    let warnings = if found.is_empty() {
        Vec::new()
    } else {
        vec![format!(
            "patched draft contains forbidden phrases: {}",
            found.join(", ")
        )]
    };

    Ok(PatchOutcome {
        body,
        changelog,
        warnings,
        system_prompt,
    })
}

/// Split model output at the changelog separator. Output without a separator
/// is treated as draft-only.
fn split_changelog(raw: &str) -> (String, String) {
    match raw.split_once(CHANGELOG_SEPARATOR) {
        Some((body, changelog)) => (body.trim().to_string(), changelog.trim().to_string()),
        None => (raw.trim().to_string(), String::new()),
    }
}

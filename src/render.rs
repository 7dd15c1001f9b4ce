//! Platform rendering: content core + platform spec -> draft body.
//!
//! Constraint enforcement is advisory: the model is asked to honor the
//! platform spec, and a post-hoc structural check turns any violation into
//! warnings attached to the result, never a hard failure.

use crate::errors::GenerationError;
use crate::llm::LmProvider;
use crate::models::{Brief, ContentCore, Draft, Platform};
use crate::resources::{PlatformSpec, StyleProfile, fill_template};

/// A rendered draft plus everything the orchestrator persists alongside it.
#[derive(Debug)]
pub struct RenderOutcome {
    pub draft: Draft,
    /// Advisory spec-violation warnings from the structural check.
    pub warnings: Vec<String>,
    /// Exact system prompt sent to the model, kept for auditability.
    pub system_prompt: String,
}

/// Render a version-1 draft for one platform.
pub async fn render(
    provider: &dyn LmProvider,
    template: &str,
    style: &StyleProfile,
    spec: &PlatformSpec,
    brief: &Brief,
    core: &ContentCore,
    platform: Platform,
) -> Result<RenderOutcome, GenerationError> {
    let core_json = serde_json::to_string_pretty(core)
        .map_err(|e| GenerationError::InvalidSchema(format!("serialize core: {e}")))?;

    let system_prompt = fill_template(
        template,
        &[
            ("language", brief.language.as_str()),
            ("min_chars", &spec.min_length_chars.to_string()),
            ("max_chars", &spec.max_length_chars.to_string()),
            ("forbidden_phrases", &style.forbidden_block()),
            ("voice_rules", &style.voice_rules()),
            ("emoji_policy", &spec.formatting.emojis),
            ("core_json", &core_json),
            ("platform_spec", &spec.to_prompt_json()),
        ],
    );
    let user_prompt = format!("Write the {platform} post now.");

    let body = provider.generate(&system_prompt, &user_prompt).await?;
    let body = body.trim().to_string();
    if body.is_empty() {
        return Err(GenerationError::InvalidSchema(
            "model returned an empty draft body".into(),
        ));
    }

    let warnings = structural_warnings(&body, spec, style);

    Ok(RenderOutcome {
        draft: Draft {
            platform,
            body,
            version: 1,
        },
        warnings,
        system_prompt,
    })
}

/// Rough post-hoc check of the draft against the platform spec and style
/// profile. Returns human-readable warnings, one per violation.
pub fn structural_warnings(body: &str, spec: &PlatformSpec, style: &StyleProfile) -> Vec<String> {
    let mut warnings = Vec::new();
    let len = body.chars().count();

    if len < spec.min_length_chars {
        warnings.push(format!(
            "draft is {len} chars, below the platform minimum of {}",
            spec.min_length_chars
        ));
    }
    if len > spec.max_length_chars {
        warnings.push(format!(
            "draft is {len} chars, above the platform maximum of {}",
            spec.max_length_chars
        ));
    }

    for section in &spec.formatting.required_sections {
        if !body.contains(section.as_str()) {
            warnings.push(format!("draft is missing required section marker '{section}'"));
        }
    }

    let found = style.forbidden_in(body);
    if !found.is_empty() {
        warnings.push(format!(
            "draft contains forbidden phrases: {}",
            found.join(", ")
        ));
    }

    warnings
}

//! Brief normalization: raw user input to a validated [`Brief`].
//!
//! Pure logic, no I/O. Normalizing an already-normalized brief yields an
//! identical brief.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::errors::PipelineError;
use crate::models::{Brief, Goal, Platform};

const DEFAULT_AUDIENCE: &str = "builders, founders, product people";
const DEFAULT_LANGUAGE: &str = "en";

/// Loosely-typed brief as read from a YAML file or HTTP body, before
/// canonicalization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawBrief {
    pub topic: Option<String>,
    pub goal: Option<String>,
    pub audience: Option<String>,
    pub platform_targets: Option<Vec<String>>,
    pub language: Option<String>,
    pub context_notes: Option<String>,
    pub constraints: Option<BTreeMap<String, String>>,
}

impl RawBrief {
    pub fn from_yaml(text: &str) -> Result<Self, PipelineError> {
        serde_yaml::from_str(text).map_err(|e| PipelineError::Validation {
            field: "brief".into(),
            message: format!("not a valid brief document: {e}"),
        })
    }
}

/// Validate and canonicalize raw input into a [`Brief`].
///
/// Platform names are lowercased and deduplicated (order preserved); unknown
/// platforms are rejected with a field-level error naming the offending value
/// and the valid set.
pub fn normalize(raw: RawBrief) -> Result<Brief, PipelineError> {
    let topic = raw.topic.map(|t| t.trim().to_string()).unwrap_or_default();
    if topic.is_empty() {
        return Err(PipelineError::Validation {
            field: "topic".into(),
            message: "topic is required and must be non-empty".into(),
        });
    }

    let goal = match raw.goal {
        Some(g) if !g.trim().is_empty() => {
            g.parse::<Goal>().map_err(|message| PipelineError::Validation {
                field: "goal".into(),
                message,
            })?
        }
        _ => Goal::Inform,
    };

    let names = raw
        .platform_targets
        .unwrap_or_else(|| Platform::ALL.iter().map(|p| p.as_str().to_string()).collect());
    if names.is_empty() {
        return Err(PipelineError::Validation {
            field: "platform_targets".into(),
            message: format!(
                "at least one platform is required; valid platforms: {}",
                Platform::valid_set()
            ),
        });
    }
    let mut platform_targets = Vec::new();
    for name in names {
        let platform = name
            .parse::<Platform>()
            .map_err(|message| PipelineError::Validation {
                field: "platform_targets".into(),
                message,
            })?;
        if !platform_targets.contains(&platform) {
            platform_targets.push(platform);
        }
    }

    let audience = match raw.audience.map(|a| a.trim().to_string()) {
        Some(a) if !a.is_empty() => a,
        _ => DEFAULT_AUDIENCE.to_string(),
    };

    let language = match raw.language.map(|l| l.trim().to_lowercase()) {
        Some(l) if !l.is_empty() => l,
        _ => DEFAULT_LANGUAGE.to_string(),
    };

    let context_notes = raw
        .context_notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    Ok(Brief {
        topic,
        goal,
        audience,
        platform_targets,
        language,
        context_notes,
        constraints: raw.constraints.unwrap_or_default(),
    })
}

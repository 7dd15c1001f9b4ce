//! Layered resource resolution: prompts, style profile, platform specs.
//!
//! Resolution order, first match wins:
//! 1. An override directory (`DRAFTSMITH_RESOURCE_DIR` or config), so users
//!    can keep private prompt/profile variants outside the repo.
//! 2. Defaults bundled into the binary at compile time.
//!
//! The pipeline consumes these as opaque configuration; nothing here is
//! interpreted by the state machine.

use std::path::PathBuf;

use serde::Deserialize;

use crate::errors::PipelineError;
use crate::models::Platform;

const CLARIFY_PROMPT: &str = include_str!("../prompts/clarify.txt");
const CORE_SYNTH_PROMPT: &str = include_str!("../prompts/core_synth.txt");
const RENDER_BLOG_PROMPT: &str = include_str!("../prompts/render_blog.txt");
const RENDER_LINKEDIN_PROMPT: &str = include_str!("../prompts/render_linkedin.txt");
const RENDER_X_PROMPT: &str = include_str!("../prompts/render_x.txt");
const PATCH_PROMPT: &str = include_str!("../prompts/patch.txt");
const STYLE_PROFILE: &str = include_str!("../profiles/style_profile.yaml");
const PLATFORM_BLOG_SPEC: &str = include_str!("../specs/platform_blog.yaml");
const PLATFORM_LINKEDIN_SPEC: &str = include_str!("../specs/platform_linkedin.yaml");
const PLATFORM_X_SPEC: &str = include_str!("../specs/platform_x.yaml");

pub const RESOURCE_DIR_ENV: &str = "DRAFTSMITH_RESOURCE_DIR";

fn bundled(rel_path: &str) -> Option<&'static str> {
    match rel_path {
        "prompts/clarify.txt" => Some(CLARIFY_PROMPT),
        "prompts/core_synth.txt" => Some(CORE_SYNTH_PROMPT),
        "prompts/render_blog.txt" => Some(RENDER_BLOG_PROMPT),
        "prompts/render_linkedin.txt" => Some(RENDER_LINKEDIN_PROMPT),
        "prompts/render_x.txt" => Some(RENDER_X_PROMPT),
        "prompts/patch.txt" => Some(PATCH_PROMPT),
        "profiles/style_profile.yaml" => Some(STYLE_PROFILE),
        "specs/platform_blog.yaml" => Some(PLATFORM_BLOG_SPEC),
        "specs/platform_linkedin.yaml" => Some(PLATFORM_LINKEDIN_SPEC),
        "specs/platform_x.yaml" => Some(PLATFORM_X_SPEC),
        _ => None,
    }
}

/// Ordered resource lookup over an optional override directory and the
/// bundled defaults.
#[derive(Debug, Clone, Default)]
pub struct ResourceResolver {
    override_dir: Option<PathBuf>,
}

impl ResourceResolver {
    pub fn new(override_dir: Option<PathBuf>) -> Self {
        Self { override_dir }
    }

    pub fn from_env() -> Self {
        let override_dir = std::env::var_os(RESOURCE_DIR_ENV)
            .map(PathBuf::from)
            .filter(|p| p.is_dir());
        Self { override_dir }
    }

    pub fn read_text(&self, rel_path: &str) -> Result<String, PipelineError> {
        if let Some(dir) = &self.override_dir {
            let candidate = dir.join(rel_path);
            if candidate.is_file() {
                return std::fs::read_to_string(&candidate)
                    .map_err(|e| PipelineError::io(format!("read {}", candidate.display()), e));
            }
        }
        bundled(rel_path)
            .map(str::to_string)
            .ok_or_else(|| PipelineError::ResourceNotFound(rel_path.to_string()))
    }

    pub fn style_profile(&self) -> Result<StyleProfile, PipelineError> {
        let text = self.read_text("profiles/style_profile.yaml")?;
        serde_yaml::from_str(&text).map_err(|e| PipelineError::Validation {
            field: "style_profile".into(),
            message: format!("invalid style profile: {e}"),
        })
    }

    pub fn platform_spec(&self, platform: Platform) -> Result<PlatformSpec, PipelineError> {
        let rel = format!("specs/platform_{platform}.yaml");
        let text = self.read_text(&rel)?;
        serde_yaml::from_str(&text).map_err(|e| PipelineError::Validation {
            field: "platform_spec".into(),
            message: format!("invalid {rel}: {e}"),
        })
    }

    pub fn render_prompt(&self, platform: Platform) -> Result<String, PipelineError> {
        self.read_text(&format!("prompts/render_{platform}.txt"))
    }
}

/// Voice rules and anti-patterns shared by every prompt.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StyleProfile {
    #[serde(default)]
    pub forbidden_ai_smell: ForbiddenSmell,
    #[serde(default)]
    pub voice: Voice,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForbiddenSmell {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub avoid_phrases: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Voice {
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default = "default_perspective")]
    pub perspective: String,
    #[serde(default)]
    pub avoid: Vec<String>,
}

impl Default for Voice {
    fn default() -> Self {
        Self {
            tone: default_tone(),
            perspective: default_perspective(),
            avoid: Vec::new(),
        }
    }
}

fn default_tone() -> String {
    "direct".into()
}

fn default_perspective() -> String {
    "practitioner".into()
}

impl StyleProfile {
    /// Bullet list of forbidden phrases for prompt interpolation.
    pub fn forbidden_block(&self) -> String {
        let phrases = &self.forbidden_ai_smell.avoid_phrases;
        if phrases.is_empty() {
            "(none)".to_string()
        } else {
            phrases
                .iter()
                .map(|p| format!("  - {p}"))
                .collect::<Vec<_>>()
                .join("\n")
        }
    }

    pub fn voice_rules(&self) -> String {
        format!(
            "Tone: {}\nPerspective: {}\nAvoid: {}",
            self.voice.tone,
            self.voice.perspective,
            self.voice.avoid.join(", ")
        )
    }

    /// Forbidden phrases present in `text`, case-insensitive.
    pub fn forbidden_in(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        self.forbidden_ai_smell
            .avoid_phrases
            .iter()
            .filter(|p| lower.contains(&p.to_lowercase()))
            .cloned()
            .collect()
    }
}

/// Per-platform rendering constraints, consumed without interpretation beyond
/// the advisory post-render check.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformSpec {
    #[serde(default = "default_min_chars")]
    pub min_length_chars: usize,
    #[serde(default = "default_max_chars")]
    pub max_length_chars: usize,
    #[serde(default)]
    pub formatting: Formatting,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Formatting {
    #[serde(default = "default_emojis")]
    pub emojis: String,
    #[serde(default)]
    pub required_sections: Vec<String>,
}

impl Default for Formatting {
    fn default() -> Self {
        Self {
            emojis: default_emojis(),
            required_sections: Vec::new(),
        }
    }
}

fn default_min_chars() -> usize {
    500
}

fn default_max_chars() -> usize {
    3000
}

fn default_emojis() -> String {
    "sparingly, max 2-3".into()
}

impl PlatformSpec {
    pub fn to_prompt_json(&self) -> String {
        // Serialized back out for prompt interpolation only.
        serde_json::json!({
            "min_length_chars": self.min_length_chars,
            "max_length_chars": self.max_length_chars,
            "formatting": {
                "emojis": self.formatting.emojis,
                "required_sections": self.formatting.required_sections,
            },
        })
        .to_string()
    }
}

/// Substitute `{key}` placeholders, leaving unrecognized braces untouched so
/// templates may contain literal JSON.
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

//! Data model for briefs, cores, drafts, and run metadata.
//!
//! Everything here serializes to the run workspace as JSON. Validation lives
//! next to the types: model output is deserialized and then checked against
//! the invariants the rest of the pipeline relies on.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::RunStatus;

/// Target platforms a run can render drafts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Blog,
    Linkedin,
    X,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Blog, Platform::Linkedin, Platform::X];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Blog => "blog",
            Platform::Linkedin => "linkedin",
            Platform::X => "x",
        }
    }

    pub fn valid_set() -> String {
        Self::ALL
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "blog" => Ok(Platform::Blog),
            "linkedin" => Ok(Platform::Linkedin),
            "x" | "twitter" => Ok(Platform::X),
            other => Err(format!(
                "unknown platform '{other}'; valid platforms: {}",
                Platform::valid_set()
            )),
        }
    }
}

/// What the content is meant to achieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Inform,
    Persuade,
    Announce,
    Educate,
    Entertain,
}

impl Goal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::Inform => "inform",
            Goal::Persuade => "persuade",
            Goal::Announce => "announce",
            Goal::Educate => "educate",
            Goal::Entertain => "entertain",
        }
    }

    pub fn valid_set() -> &'static str {
        "inform, persuade, announce, educate, entertain"
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Goal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inform" => Ok(Goal::Inform),
            "persuade" => Ok(Goal::Persuade),
            "announce" => Ok(Goal::Announce),
            "educate" => Ok(Goal::Educate),
            "entertain" => Ok(Goal::Entertain),
            other => Err(format!(
                "unknown goal '{other}'; valid goals: {}",
                Goal::valid_set()
            )),
        }
    }
}

/// Normalized user intent. Immutable after creation except for append-only
/// clarification amendments to `context_notes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brief {
    pub topic: String,
    pub goal: Goal,
    pub audience: String,
    pub platform_targets: Vec<Platform>,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_notes: Option<String>,
    #[serde(default)]
    pub constraints: BTreeMap<String, String>,
}

impl Brief {
    /// Append a clarification answer to the context notes. Existing notes are
    /// never overwritten.
    pub fn append_context(&mut self, answer: &str) {
        match &mut self.context_notes {
            Some(notes) => {
                let trimmed = notes.trim_end().to_string();
                *notes = format!("{trimmed}\n\n{answer}");
            }
            None => self.context_notes = Some(answer.to_string()),
        }
    }
}

/// One supporting point of a content core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorePoint {
    pub claim: String,
    #[serde(default)]
    pub support: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// Synthesized thesis/angle/points structure derived from a brief.
/// Regeneration overwrites; cores are never versioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentCore {
    pub thesis: String,
    pub angle: String,
    pub points: Vec<CorePoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional_counterpoint: Option<String>,
    #[serde(default)]
    pub product_update: bool,
    #[serde(default)]
    pub do_not_say: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_notes: Option<String>,
}

impl ContentCore {
    /// Check the invariants a deserialized core must satisfy before it is
    /// accepted as model output.
    pub fn validate(&self) -> Result<(), String> {
        if self.thesis.trim().is_empty() {
            return Err("thesis is empty".into());
        }
        if self.angle.trim().is_empty() {
            return Err("angle is empty".into());
        }
        if self.points.is_empty() {
            return Err("points is empty".into());
        }
        for (i, point) in self.points.iter().enumerate() {
            if point.claim.trim().is_empty() {
                return Err(format!("point {} has an empty claim", i + 1));
            }
        }
        Ok(())
    }
}

/// Model verdict on whether a brief carries enough context to synthesize from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationResult {
    pub needs_clarification: bool,
    #[serde(default)]
    pub questions: Vec<String>,
}

/// A versioned, platform-specific rendered text artifact. The body is stored
/// as `<platform>.md`; prior versions as `<platform>_v<N>.md`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub platform: Platform,
    pub body: String,
    pub version: u32,
}

/// One entry in a platform's changelog. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchRecord {
    pub from_version: u32,
    pub to_version: u32,
    pub directive: String,
    pub model: String,
    #[serde(default)]
    pub changelog: String,
    pub created_at: DateTime<Utc>,
}

/// Run-level metadata, mutated only by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMeta {
    pub run_id: String,
    pub topic: String,
    pub language: String,
    pub status: RunStatus,
    pub platform_targets: Vec<Platform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RunMeta {
    pub fn new(run_id: String, brief: &Brief) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            topic: brief.topic.clone(),
            language: brief.language.clone(),
            status: RunStatus::Created,
            platform_targets: brief.platform_targets.clone(),
            model: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

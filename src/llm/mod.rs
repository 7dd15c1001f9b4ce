//! External model boundary.
//!
//! The pipeline depends only on the [`LmProvider`] contract: send a
//! system/user prompt pair, get text back, with failures classified as
//! timeout, provider error, or schema-invalid output. Nothing downstream
//! knows which provider is behind it.

pub mod openai;

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::de::DeserializeOwned;

use crate::errors::GenerationError;

pub use openai::OpenAiProvider;

/// An opaque language-model backend.
#[async_trait]
pub trait LmProvider: Send + Sync {
    /// Send system + user messages and return the assistant response text.
    async fn generate(&self, system: &str, user: &str) -> Result<String, GenerationError>;

    /// Model identifier recorded in run metadata and patch records.
    fn model_name(&self) -> &str;
}

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*\n?(.*?)```").expect("fence regex is valid")
});

/// Remove a markdown code fence wrapping the payload, if present.
pub fn strip_code_fences(text: &str) -> String {
    match FENCE_RE.captures(text) {
        Some(caps) => caps[1].trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Generate text and parse it as JSON into `T`.
///
/// Parsed once, never retried here: schema-invalid output is a prompt/schema
/// defect and retry policy belongs to the orchestrator.
pub async fn generate_structured<T: DeserializeOwned>(
    provider: &dyn LmProvider,
    system: &str,
    user: &str,
) -> Result<T, GenerationError> {
    let raw = provider.generate(system, user).await?;
    let cleaned = strip_code_fences(&raw);
    serde_json::from_str(&cleaned).map_err(|e| {
        GenerationError::InvalidSchema(format!(
            "{e} (response started with: {:.80})",
            cleaned.replace('\n', " ")
        ))
    })
}

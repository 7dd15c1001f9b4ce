//! OpenAI chat-completions provider.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::errors::GenerationError;

use super::LmProvider;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OpenAiProvider {
    /// Build a provider from the environment. Fails fast when the API key is
    /// missing so no run state is touched.
    pub fn from_env(model: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            anyhow::anyhow!(
                "{API_KEY_ENV} environment variable is not set. \
                 Export it before running model commands: export {API_KEY_ENV}='sk-...'"
            )
        })?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.into(),
            temperature: 0.4,
            timeout,
        })
    }
}

#[async_trait]
impl LmProvider for OpenAiProvider {
    async fn generate(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });

        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GenerationError::Provider(format!(
                "OpenAI returned {status}: {}",
                detail.chars().take(300).collect::<String>()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| classify(e, self.timeout))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| GenerationError::Provider("OpenAI returned an empty completion".into()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn classify(error: reqwest::Error, timeout: Duration) -> GenerationError {
    if error.is_timeout() {
        GenerationError::Timeout {
            seconds: timeout.as_secs(),
        }
    } else {
        GenerationError::Provider(error.to_string())
    }
}

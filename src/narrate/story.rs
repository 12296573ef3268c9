//! Core `StoryGenerator` trait and `ApiStoryGenerator` implementation.
//!
//! `ApiStoryGenerator` calls any OpenAI-compatible `/v1/chat/completions`
//! endpoint — OpenAI, Groq, Ollama (OpenAI mode), LM Studio, vLLM, etc.
//! All connection details come from [`StoryConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::StoryConfig;

// ---------------------------------------------------------------------------
// StoryError
// ---------------------------------------------------------------------------

/// Errors that can occur during story generation.
#[derive(Debug, Error)]
pub enum StoryError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("story request timed out")]
    Timeout,

    /// The provider answered with a non-success status code.
    #[error("story provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse story response: {0}")]
    Parse(String),

    /// The provider returned a completion with no usable text content.
    #[error("story provider returned an empty completion")]
    EmptyStory,
}

impl From<reqwest::Error> for StoryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StoryError::Timeout
        } else {
            StoryError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// StoryGenerator trait
// ---------------------------------------------------------------------------

/// Async trait for generating a narrated story from a rendered prompt.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn StoryGenerator>`).
///
/// Contract: single attempt, no internal retry — a failed run is recovered
/// only by the user re-triggering narration.
#[async_trait]
pub trait StoryGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, StoryError>;
}

// ---------------------------------------------------------------------------
// ApiStoryGenerator
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// The prompt arrives fully rendered (the `{city}` placeholder already
/// substituted); this type only handles the wire exchange.
pub struct ApiStoryGenerator {
    client: reqwest::Client,
    config: StoryConfig,
}

impl ApiStoryGenerator {
    /// Build an `ApiStoryGenerator` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`. A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &StoryConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl StoryGenerator for ApiStoryGenerator {
    /// Send the rendered prompt to the configured endpoint.
    ///
    /// The `Authorization: Bearer …` header is attached **only** when
    /// `config.api_key` is `Some(key)` and `key` is non-empty — safe for
    /// local providers that require no authentication.
    async fn generate(&self, prompt: &str) -> Result<String, StoryError> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);

        let body = serde_json::json!({
            "model":       self.config.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "max_tokens":  self.config.max_tokens,
            "temperature": self.config.temperature
        });

        let mut req = self.client.post(&url).json(&body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| StoryError::Parse(e.to_string()))?;

        let story = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(StoryError::EmptyStory)?
            .trim()
            .to_string();

        if story.is_empty() {
            return Err(StoryError::EmptyStory);
        }

        Ok(story)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

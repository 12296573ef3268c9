//! Core `SpeechSynthesizer` trait and `ElevenLabsSynthesizer` implementation.
//!
//! `ElevenLabsSynthesizer` calls the ElevenLabs `/v1/text-to-speech/{voice}`
//! endpoint and returns the raw audio byte stream as an [`AudioClip`]. All
//! connection details — including the voice and model identifiers — come
//! from [`SpeechConfig`].

use async_trait::async_trait;
use thiserror::Error;

use crate::config::SpeechConfig;

// ---------------------------------------------------------------------------
// AudioClip
// ---------------------------------------------------------------------------

/// Opaque handle to one synthesized narration (encoded audio bytes, MPEG by
/// default).
///
/// Created only by a speech synthesizer; played only by the playback
/// controller. Replacing the clip in the controller invalidates the previous
/// one — its playback state is discarded, not merged.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioClip {
    bytes: Vec<u8>,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Audio payloads are large; keep debug output to the byte count.
        write!(f, "AudioClip({} bytes)", self.bytes.len())
    }
}

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

/// Errors that can occur during speech synthesis.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("speech request timed out")]
    Timeout,

    /// The provider answered with a non-success status code.
    #[error("speech provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider answered 200 with an empty body.
    #[error("speech provider returned no audio data")]
    EmptyAudio,
}

impl From<reqwest::Error> for SpeechError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SpeechError::Timeout
        } else {
            SpeechError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

/// Async trait for turning story text into a playable audio clip.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn SpeechSynthesizer>`).
///
/// Contract: single attempt, no internal retry.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, SpeechError>;
}

// ---------------------------------------------------------------------------
// ElevenLabsSynthesizer
// ---------------------------------------------------------------------------

/// Calls the ElevenLabs text-to-speech REST API.
pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    config: SpeechConfig,
}

impl ElevenLabsSynthesizer {
    /// Build an `ElevenLabsSynthesizer` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`. A default client is used as a last-resort
    /// fallback if the builder fails (should never happen in practice).
    pub fn from_config(config: &SpeechConfig) -> Self {
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
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    /// POST the story text and collect the raw audio byte stream.
    ///
    /// The `xi-api-key` header is attached **only** when `config.api_key`
    /// is `Some(key)` and `key` is non-empty.
    async fn synthesize(&self, text: &str) -> Result<AudioClip, SpeechError> {
        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.config.base_url, self.config.voice_id
        );

        let body = serde_json::json!({
            "text":     text,
            "model_id": self.config.model_id,
            "voice_settings": {
                "stability":        self.config.stability,
                "similarity_boost": self.config.similarity_boost
            }
        });

        let mut req = self
            .client
            .post(&url)
            .header("Accept", "audio/mpeg")
            .json(&body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.header("xi-api-key", key);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }

        Ok(AudioClip::new(bytes.to_vec()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

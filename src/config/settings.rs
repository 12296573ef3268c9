//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::narrate::prompt::DEFAULT_PROMPT_TEMPLATE;

use super::AppPaths;

// ---------------------------------------------------------------------------
// GeocodingConfig
// ---------------------------------------------------------------------------

/// Settings for the reverse-geocoding adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Base URL of a Nominatim-compatible endpoint.
    pub base_url: String,
    /// Nominatim zoom level; 10 ≈ city granularity.
    pub zoom: u8,
    /// Maximum seconds to wait for a lookup before timing out.
    pub timeout_secs: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".into(),
            zoom: 10,
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// StoryConfig
// ---------------------------------------------------------------------------

/// Settings for the story text-generation step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryConfig {
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    /// API key — `None` for local providers that need no authentication.
    pub api_key: Option<String>,
    /// Model identifier sent to the API (e.g. `"gpt-3.5-turbo"`).
    pub model: String,
    /// Upper bound on generated story length, in tokens.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 1.0). Lower = more deterministic.
    pub temperature: f32,
    /// Maximum seconds to wait for a completion before timing out.
    pub timeout_secs: u64,
    /// Story prompt with a `{city}` placeholder, editable by the user.
    pub prompt_template: String,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".into(),
            api_key: None,
            model: "gpt-3.5-turbo".into(),
            max_tokens: 1000,
            temperature: 0.7,
            timeout_secs: 60,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for the speech-synthesis step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Base URL of the ElevenLabs-compatible API.
    pub base_url: String,
    /// API key sent in the `xi-api-key` header — `None` to omit.
    pub api_key: Option<String>,
    /// Voice identifier appended to the text-to-speech path.
    pub voice_id: String,
    /// Model identifier sent in the request body.
    pub model_id: String,
    /// Voice stability (0.0 – 1.0).
    pub stability: f32,
    /// Voice similarity boost (0.0 – 1.0).
    pub similarity_boost: f32,
    /// Maximum seconds to wait for synthesis before timing out.
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".into(),
            api_key: None,
            voice_id: "21m00Tcm4TlvDq8ikWAM".into(),
            model_id: "eleven_monolingual_v1".into(),
            stability: 0.5,
            similarity_boost: 0.5,
            timeout_secs: 120,
        }
    }
}

// ---------------------------------------------------------------------------
// PlaybackConfig
// ---------------------------------------------------------------------------

/// Settings for narration playback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Start playing as soon as a narration becomes ready.
    pub autoplay: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self { autoplay: true }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use city_stories::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Reverse-geocoding settings.
    pub geocoding: GeocodingConfig,
    /// Story generation settings.
    pub story: StoryConfig,
    /// Speech synthesis settings.
    pub speech: SpeechConfig,
    /// Playback settings.
    pub playback: PlaybackConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

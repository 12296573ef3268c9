//! Configuration module for city-stories.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each adapter,
//! `AppPaths` for cross-platform data directories, and TOML persistence via
//! `AppConfig::load` / `AppConfig::save`.
//!
//! API keys and endpoints live here and are passed explicitly into the
//! adapters — nothing reads the process environment at call time, which
//! keeps the pipeline deterministic under test.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, GeocodingConfig, PlaybackConfig, SpeechConfig, StoryConfig};

//! city-stories — location-aware narration core.
//!
//! Tracks a user's position, reverse-geocodes it to a city name, and on each
//! city change offers to generate a short narrated story about that city:
//! text generation first, speech synthesis second, playback last.
//!
//! # Architecture
//!
//! ```text
//! location feed ─▶ geocode (CityResolver) ─▶ detect (CityChangeDetector)
//!                                                 │ arrival event
//!                                                 ▼
//!              narrate (StoryGenerator ─▶ SpeechSynthesizer)
//!                                                 │ AudioClip
//!                                                 ▼
//!                              playback (PlaybackController)
//! ```
//!
//! The [`pipeline`] module ties it together: a single orchestrator task
//! consumes [`pipeline::ExplorerCommand`]s and mutates the shared
//! [`pipeline::AppState`], which any presentation layer (the bundled
//! line-driven shell, a GUI, tests) reads as a snapshot.
//!
//! All network backends sit behind async traits and take their endpoints and
//! API keys from [`config::AppConfig`] — swap in fakes for deterministic
//! tests.

pub mod config;
pub mod detect;
pub mod geo;
pub mod geocode;
pub mod narrate;
pub mod pipeline;
pub mod playback;

//! Narration pipeline building blocks.
//!
//! This module provides:
//! * [`NarrationState`] — tagged-union state of the two-stage pipeline.
//! * [`PromptTemplate`] — `{city}` substitution for the story prompt.
//! * [`StoryGenerator`] / [`ApiStoryGenerator`] — text-generation backends.
//! * [`SpeechSynthesizer`] / [`ElevenLabsSynthesizer`] — TTS backends.
//! * [`AudioClip`] — opaque handle to one synthesized narration.
//! * [`StoryError`] / [`SpeechError`] — per-stage error variants.
//!
//! The sequencing itself (text → audio, shared busy flag, auto-play) lives
//! in the orchestrator; these pieces stay independently testable.

pub mod prompt;
pub mod speech;
pub mod state;
pub mod story;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use prompt::PromptTemplate;
pub use speech::{AudioClip, ElevenLabsSynthesizer, SpeechError, SpeechSynthesizer};
pub use state::NarrationState;
pub use story::{ApiStoryGenerator, StoryError, StoryGenerator};

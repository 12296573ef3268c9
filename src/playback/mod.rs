//! Audio playback module.
//!
//! This module provides:
//! * [`AudioSink`] — trait over the actual audio output device.
//! * [`RodioSink`] — rodio-backed sink on a dedicated playback thread.
//! * [`NullSink`] — inert sink for tests and audio-less environments.
//! * [`PlaybackController`] — play/pause state, independent of generation.
//! * [`PlaybackError`] — error variants for playback operations.
//!
//! The controller owns the only handle to the current clip's playback state;
//! the narration pipeline merely hands clips over. Toggling with no clip
//! loaded is a guarded no-op.

pub mod controller;
pub mod sink;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use controller::PlaybackController;
pub use sink::{AudioSink, NullSink, PlaybackError, RodioSink};

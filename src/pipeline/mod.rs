//! Core orchestration: shared state + the command-driven story orchestrator.
//!
//! This module provides:
//! * [`AppState`] / [`SharedState`] — the single source of truth the
//!   presentation layer reads.
//! * [`ExplorerCommand`] — everything the feed and the user can ask for.
//! * [`StoryOrchestrator`] — the async loop that ties geocoding, city-change
//!   detection, narration and playback together.

pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use runner::{ExplorerCommand, StoryOrchestrator};
pub use state::{new_shared_state, AppState, SharedState};

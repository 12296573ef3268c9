//! Shared application state.
//!
//! [`AppState`] is the single source of truth for everything the
//! presentation layer needs: latest position, detection snapshot, narration
//! state, playback flag, config snapshot, and any error message.
//!
//! [`SharedState`] is a type alias for `Arc<Mutex<AppState>>` — cheap to
//! clone and safe to share across threads.

use std::sync::{Arc, Mutex};

use crate::config::AppConfig;
use crate::detect::DetectionState;
use crate::geo::Coordinate;
use crate::narrate::NarrationState;

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Shared application state — the single source of truth for the
/// presentation layer.
///
/// Held behind [`SharedState`] (`Arc<Mutex<AppState>>`). The orchestrator
/// mutates it; the presentation layer reads snapshots.
pub struct AppState {
    /// Latest raw position sample, if any has arrived yet.
    pub position: Option<Coordinate>,

    /// Snapshot of the city-change detector: current candidate, last
    /// confirmed city, and whether an arrival affordance should be shown.
    pub detection: DetectionState,

    /// Current phase of the narration pipeline.
    pub narration: NarrationState,

    /// Whether narration audio is audibly playing right now.
    pub is_playing: bool,

    /// Current application configuration.
    ///
    /// The pipeline reads `story.prompt_template` and `playback.autoplay`
    /// from here on every run, so template edits apply to the next run.
    pub config: AppConfig,

    /// The latest error, if any — a single message, no history.
    ///
    /// Covers all taxonomy entries: location unavailable, geocoding failed,
    /// and both narration stages.
    pub error_message: Option<String>,
}

impl AppState {
    /// Create a new `AppState` with sensible defaults.
    pub fn new(config: AppConfig) -> Self {
        Self {
            position: None,
            detection: DetectionState::default(),
            narration: NarrationState::Idle,
            is_playing: false,
            config,
            error_message: None,
        }
    }

    /// City label for display: the current candidate's name, or `"N/A"`
    /// when the latest lookup did not resolve.
    pub fn current_city_label(&self) -> &str {
        self.detection
            .current
            .as_ref()
            .and_then(|c| c.name())
            .unwrap_or("N/A")
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`AppState`].
///
/// Cheap to clone (`Arc` clone). Lock with `.lock().unwrap()` for a short
/// critical section; do **not** hold the lock across `.await` points.
pub type SharedState = Arc<Mutex<AppState>>;

/// Construct a new [`SharedState`] wrapping a default [`AppState`].
pub fn new_shared_state(config: AppConfig) -> SharedState {
    Arc::new(Mutex::new(AppState::new(config)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::CityCandidate;

    #[test]
    fn fresh_state_has_nothing_to_show() {
        let state = AppState::default();
        assert!(state.position.is_none());
        assert_eq!(state.narration, NarrationState::Idle);
        assert!(!state.is_playing);
        assert!(state.error_message.is_none());
        assert!(!state.detection.arrival_pending);
    }

    #[test]
    fn city_label_falls_back_to_na() {
        let mut state = AppState::default();
        assert_eq!(state.current_city_label(), "N/A");

        state.detection.current = Some(CityCandidate::Unresolved);
        assert_eq!(state.current_city_label(), "N/A");

        state.detection.current = Some(CityCandidate::Resolved("Lisbon".into()));
        assert_eq!(state.current_city_label(), "Lisbon");
    }

    #[test]
    fn shared_state_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedState>();
    }

    #[test]
    fn shared_state_can_be_cloned_and_mutated() {
        let state = new_shared_state(AppConfig::default());
        let state2 = Arc::clone(&state);

        state.lock().unwrap().is_playing = true;
        assert!(state2.lock().unwrap().is_playing);
    }
}

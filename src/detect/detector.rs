//! City-change detector state machine.
//!
//! One [`observe`](CityChangeDetector::observe) call per geocoded sample.
//! The transitions are:
//!
//! ```text
//! candidate = Unresolved        ──▶ record current, no event
//! candidate == last confirmed   ──▶ no-op (still here)
//! candidate != last confirmed   ──▶ confirm, arrival_pending = true,
//!                                   emit ArrivalEvent exactly once
//! ```
//!
//! The very first resolved city always counts as an arrival (nothing is
//! confirmed at startup). There is deliberately no debounce window: walking
//! back and forth across a boundary fires an arrival on every edge.

use crate::geocode::CityCandidate;

// ---------------------------------------------------------------------------
// ArrivalEvent
// ---------------------------------------------------------------------------

/// Discrete signal meaning "the detector has confirmed entry into a city
/// distinct from the last confirmed one".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrivalEvent {
    /// The newly confirmed city name.
    pub city: String,
}

// ---------------------------------------------------------------------------
// DetectionState
// ---------------------------------------------------------------------------

/// Snapshot of the detector's state, mirrored into the shared app state so
/// the presentation layer can render it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionState {
    /// The last city for which an arrival event was emitted.
    ///
    /// Updates only when an arrival fires — never on repeated detections of
    /// the same city and never on unresolved lookups.
    pub last_confirmed: Option<String>,

    /// What the most recent lookup said, resolved or not. `None` until the
    /// first sample has been processed.
    pub current: Option<CityCandidate>,

    /// Raised when an arrival fires; drives the "tell me about this city"
    /// affordance. Stays raised until the next session state reset — the
    /// affordance remains available while the user is in the city.
    pub arrival_pending: bool,
}

// ---------------------------------------------------------------------------
// CityChangeDetector
// ---------------------------------------------------------------------------

/// Debounces noisy geocoding candidates into discrete arrival events.
///
/// Owned by the orchestrator; lives for the whole session.
#[derive(Debug, Default)]
pub struct CityChangeDetector {
    state: DetectionState,
}

impl CityChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state snapshot.
    pub fn state(&self) -> &DetectionState {
        &self.state
    }

    /// Ingest one geocoded candidate; returns `Some` exactly once per
    /// distinct confirmed city.
    pub fn observe(&mut self, candidate: CityCandidate) -> Option<ArrivalEvent> {
        let name = candidate.name().map(str::to_string);
        match name {
            None => {
                // Unresolved: remember that we don't know where we are, but
                // keep the confirmed city untouched.
                log::debug!("detect: unresolved candidate, keeping last confirmed city");
                self.state.current = Some(CityCandidate::Unresolved);
                None
            }
            Some(name) if self.state.last_confirmed.as_deref() == Some(name.as_str()) => {
                log::debug!("detect: still in {name}");
                self.state.current = Some(candidate);
                None
            }
            Some(name) => {
                log::info!("detect: arrived in {name}");
                let event = ArrivalEvent { city: name.clone() };
                self.state.last_confirmed = Some(name);
                self.state.current = Some(candidate);
                self.state.arrival_pending = true;
                Some(event)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

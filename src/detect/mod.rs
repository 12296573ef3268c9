//! City-change detection.
//!
//! [`CityChangeDetector`] is a pure state machine: it never touches the
//! network. The orchestrator resolves each coordinate sample into a
//! [`CityCandidate`](crate::geocode::CityCandidate) first, then feeds the
//! candidate in here and reacts to the returned [`ArrivalEvent`], if any.

pub mod detector;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use detector::{ArrivalEvent, CityChangeDetector, DetectionState};

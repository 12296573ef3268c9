//! Reverse-geocoding adapter.
//!
//! This module provides:
//! * [`CityResolver`] — async trait implemented by all resolver backends.
//! * [`NominatimResolver`] — OpenStreetMap Nominatim `/reverse` backend.
//! * [`CityCandidate`] — one lookup's provisional, unconfirmed result.
//! * [`GeocodeError`] — error variants for geocoding operations.
//!
//! A candidate is exactly that: the city-change detector decides whether it
//! amounts to an arrival. The adapter performs a single attempt per call —
//! no retry, no cache — so every new coordinate triggers a fresh lookup.

pub mod resolver;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use resolver::{CityCandidate, CityResolver, GeocodeError, NominatimResolver};

// test-only re-export so other modules' test code can import the mock
// without `use city_stories::geocode::resolver::MockResolver`.
#[cfg(test)]
pub use resolver::MockResolver;

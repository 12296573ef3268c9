//! Feed-side location types.
//!
//! The geolocation feed itself (GPS, browser API, replay file …) lives
//! outside this crate; it pushes [`LocationEvent`]s into the orchestrator's
//! command channel. This module only defines the types that cross that
//! boundary.

// ---------------------------------------------------------------------------
// Coordinate
// ---------------------------------------------------------------------------

/// A single geographic position sample.
///
/// Ephemeral: the core keeps only the latest sample plus whatever is in
/// flight through the geocoder — no history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Degrees north, expected range [-90, 90].
    pub latitude: f64,
    /// Degrees east, expected range [-180, 180].
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` when both components are finite and within the valid
    /// geographic range.
    ///
    /// Malformed samples (NaN from a broken feed, out-of-range values) must
    /// never reach the geocoding provider; the resolver short-circuits them
    /// to an unresolved candidate.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

// ---------------------------------------------------------------------------
// LocationEvent
// ---------------------------------------------------------------------------

/// Events emitted by the external geolocation feed.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    /// A fresh position sample. Delivery is push-based and unbounded in
    /// rate; the orchestrator processes samples strictly one at a time.
    Sample(Coordinate),

    /// The feed has become unavailable (permissions revoked, no fix, …).
    ///
    /// Fatal to location tracking until the feed recovers; surfaced as a
    /// user-visible banner message. Detection state is left untouched.
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

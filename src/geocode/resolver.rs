//! Core `CityResolver` trait and `NominatimResolver` implementation.
//!
//! `NominatimResolver` calls any Nominatim-compatible `/reverse` endpoint —
//! the public OSM instance or a self-hosted one. All connection details come
//! from [`GeocodingConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::GeocodingConfig;
use crate::geo::Coordinate;

// ---------------------------------------------------------------------------
// CityCandidate
// ---------------------------------------------------------------------------

/// Result of one reverse-geocoding lookup.
///
/// A candidate is provisional — it becomes meaningful only once the
/// city-change detector compares it against the last confirmed city.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CityCandidate {
    /// The provider returned a usable place name at some granularity.
    Resolved(String),
    /// No address, no recognised granularity field, or a failed lookup that
    /// the caller chose to treat as "don't know".
    Unresolved,
}

impl CityCandidate {
    /// The resolved name, or `None` for [`CityCandidate::Unresolved`].
    pub fn name(&self) -> Option<&str> {
        match self {
            CityCandidate::Resolved(name) => Some(name),
            CityCandidate::Unresolved => None,
        }
    }
}

// ---------------------------------------------------------------------------
// GeocodeError
// ---------------------------------------------------------------------------

/// Errors that can occur during a reverse-geocoding lookup.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("geocoding request timed out")]
    Timeout,

    /// The provider answered with a non-success status code.
    #[error("geocoding provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse geocoding response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for GeocodeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GeocodeError::Timeout
        } else {
            GeocodeError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// CityResolver trait
// ---------------------------------------------------------------------------

/// Async trait for reverse-geocoding a coordinate into a city candidate.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks
/// (e.g. wrapped in `Arc<dyn CityResolver>`).
///
/// Contract: single attempt, no internal retry. A malformed coordinate must
/// short-circuit to [`CityCandidate::Unresolved`] without issuing a lookup.
#[async_trait]
pub trait CityResolver: Send + Sync {
    async fn resolve_city(&self, coord: Coordinate) -> Result<CityCandidate, GeocodeError>;
}

// ---------------------------------------------------------------------------
// Nominatim wire format
// ---------------------------------------------------------------------------

/// The subset of a Nominatim `/reverse` response we care about.
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    address: Option<Address>,
}

/// Address granularities, broadest-to-narrowest preference handled in
/// [`Address::place_name`].
#[derive(Debug, Default, Deserialize)]
struct Address {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    state: Option<String>,
}

impl Address {
    /// First present field wins, in order: city, town, village, municipality,
    /// county, state.
    fn place_name(&self) -> Option<&str> {
        self.city
            .as_deref()
            .or(self.town.as_deref())
            .or(self.village.as_deref())
            .or(self.municipality.as_deref())
            .or(self.county.as_deref())
            .or(self.state.as_deref())
    }
}

// ---------------------------------------------------------------------------
// NominatimResolver
// ---------------------------------------------------------------------------

/// Calls a Nominatim-compatible `/reverse` endpoint.
///
/// Requests use `format=json` with `addressdetails=1` and the configured
/// zoom level (10 ≈ city granularity). Nominatim's usage policy requires an
/// identifying `User-Agent`, which is set on the client at build time.
pub struct NominatimResolver {
    client: reqwest::Client,
    config: GeocodingConfig,
}

impl NominatimResolver {
    /// Build a `NominatimResolver` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`. A default client is used as a last-resort
    /// fallback if the builder fails (should never happen in practice).
    pub fn from_config(config: &GeocodingConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("city-stories/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl CityResolver for NominatimResolver {
    async fn resolve_city(&self, coord: Coordinate) -> Result<CityCandidate, GeocodeError> {
        // Malformed samples never reach the provider.
        if !coord.is_valid() {
            log::debug!("geocode: invalid coordinate {coord:?}, skipping lookup");
            return Ok(CityCandidate::Unresolved);
        }

        let url = format!("{}/reverse", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", coord.latitude.to_string()),
                ("lon", coord.longitude.to_string()),
                ("format", "json".to_string()),
                ("zoom", self.config.zoom.to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ReverseResponse = response
            .json()
            .await
            .map_err(|e| GeocodeError::Parse(e.to_string()))?;

        let candidate = match parsed.address.as_ref().and_then(Address::place_name) {
            Some(name) => CityCandidate::Resolved(name.to_string()),
            None => CityCandidate::Unresolved,
        };

        log::debug!("geocode: {coord} -> {candidate:?}");
        Ok(candidate)
    }
}

// ---------------------------------------------------------------------------
// MockResolver (test helper)
// ---------------------------------------------------------------------------

/// Scripted resolver for tests: returns its canned outcomes in order, then
/// repeats the last one.
#[cfg(test)]
pub struct MockResolver {
    outcomes: std::sync::Mutex<Vec<Result<CityCandidate, GeocodeError>>>,
    /// Number of `resolve_city` calls observed.
    pub calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockResolver {
    pub fn new(outcomes: Vec<Result<CityCandidate, GeocodeError>>) -> Self {
        // Reverse so pop() yields front-to-back order.
        let mut outcomes = outcomes;
        outcomes.reverse();
        Self {
            outcomes: std::sync::Mutex::new(outcomes),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Resolver that always returns the same city name.
    pub fn always(name: &str) -> Self {
        Self::new(vec![Ok(CityCandidate::Resolved(name.to_string()))])
    }
}

#[cfg(test)]
#[async_trait]
impl CityResolver for MockResolver {
    async fn resolve_city(&self, _coord: Coordinate) -> Result<CityCandidate, GeocodeError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let mut outcomes = self.outcomes.lock().unwrap();
        if outcomes.len() > 1 {
            outcomes.pop().unwrap()
        } else {
            // Clone-by-reconstruction: GeocodeError is not Clone.
            match outcomes.last() {
                Some(Ok(candidate)) => Ok(candidate.clone()),
                Some(Err(e)) => Err(GeocodeError::Request(e.to_string())),
                None => Ok(CityCandidate::Unresolved),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

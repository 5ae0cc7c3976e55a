use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use ts_rs::TS;
use utoipa::ToSchema;

/// Upper bound on a single provider call. A timeout is treated identically to a
/// provider outage.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Geocoded
///
/// A successful forward-geocoding result: coordinates plus the provider's
/// human-readable display address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Geocoded {
    pub lat: f64,
    pub lon: f64,
    pub display_address: String,
}

/// GeocodeError
///
/// `NotFound` means the provider answered with zero results (or the query was
/// blank); `Unavailable` covers timeouts, transport failures and non-2xx
/// responses. The two are distinct because only the former is a caller-input
/// problem. No retries happen at this layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodeError {
    #[error("no coordinates found for this query")]
    NotFound,
    #[error("geocoding provider unavailable: {0}")]
    Unavailable(String),
}

/// Geocoder
///
/// Abstract contract for the address-resolution gateway. Trait-object form
/// (`Arc<dyn Geocoder>`) lets the intake pipeline and the HTTP handlers share one
/// rate-limited client, and lets tests substitute `MockGeocoder`.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Forward-geocodes a free-text query to coordinates and a display address.
    async fn resolve(&self, query: &str) -> Result<Geocoded, GeocodeError>;

    /// Reverse lookup: coordinates to a display address.
    async fn reverse_resolve(&self, lat: f64, lon: f64) -> Result<String, GeocodeError>;
}

/// GeocoderState
///
/// The concrete type used to share the geocoding gateway across the application state.
pub type GeocoderState = Arc<dyn Geocoder>;

/// CallGate
///
/// Serialized-access rate limiter for the provider's call-rate ceiling. The
/// last-call instant sits behind a mutex held across the wait, so concurrent
/// callers queue rather than race on the timestamp: each caller sleeps out the
/// remaining delay before its slot is stamped.
pub struct CallGate {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl CallGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Blocks until the minimum inter-call interval since the previous caller's
    /// slot has elapsed, then claims the current instant as the new slot.
    pub async fn wait(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

// --- Nominatim wire format ---

/// One entry of the Nominatim /search response. Coordinates arrive as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

/// The Nominatim /reverse response.
#[derive(Debug, Deserialize)]
struct NominatimReverse {
    display_name: Option<String>,
}

/// NominatimGeocoder
///
/// The real gateway implementation against a Nominatim-compatible HTTP provider.
/// Every outbound request carries the configured identifying User-Agent label and
/// passes through the shared `CallGate`.
pub struct NominatimGeocoder {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
    gate: CallGate,
}

impl NominatimGeocoder {
    /// new
    ///
    /// Constructs the client with a bounded per-request timeout and the given
    /// minimum inter-call interval.
    ///
    /// # Panics
    /// Panics if the HTTP client cannot be constructed. This runs once at
    /// startup, and a client without the request timeout must never be used.
    pub fn new(base_url: &str, user_agent: &str, min_interval: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("FATAL: failed to construct the geocoding HTTP client");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
            gate: CallGate::new(min_interval),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    /// resolve
    ///
    /// Forward geocoding via /search. A blank query short-circuits to `NotFound`
    /// without spending a rate-limit slot.
    async fn resolve(&self, query: &str) -> Result<Geocoded, GeocodeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GeocodeError::NotFound);
        }

        self.gate.wait().await;

        let url = format!("{}/search", self.base_url);
        let response = self
            .http
            .get(url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("limit", "1"),
                ("addressdetails", "1"),
            ])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| GeocodeError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeocodeError::Unavailable(format!(
                "provider returned status {}",
                response.status()
            )));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| GeocodeError::Unavailable(e.to_string()))?;

        let place = places.into_iter().next().ok_or(GeocodeError::NotFound)?;

        // Nominatim serializes coordinates as strings; unparseable values are a
        // provider fault, not a missing result.
        let lat: f64 = place
            .lat
            .parse()
            .map_err(|_| GeocodeError::Unavailable("malformed latitude".to_string()))?;
        let lon: f64 = place
            .lon
            .parse()
            .map_err(|_| GeocodeError::Unavailable("malformed longitude".to_string()))?;

        Ok(Geocoded {
            lat,
            lon,
            display_address: place.display_name,
        })
    }

    /// reverse_resolve
    ///
    /// Reverse geocoding via /reverse. Nominatim reports an unknown location with
    /// a body lacking `display_name`, which maps to `NotFound`.
    async fn reverse_resolve(&self, lat: f64, lon: f64) -> Result<String, GeocodeError> {
        self.gate.wait().await;

        let url = format!("{}/reverse", self.base_url);
        let response = self
            .http
            .get(url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("format", "json".to_string()),
            ])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| GeocodeError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeocodeError::Unavailable(format!(
                "provider returned status {}",
                response.status()
            )));
        }

        let body: NominatimReverse = response
            .json()
            .await
            .map_err(|e| GeocodeError::Unavailable(e.to_string()))?;

        body.display_name.ok_or(GeocodeError::NotFound)
    }
}

// --- Mock Implementation (For Unit Tests) ---

/// MockGeocoder
///
/// A mock implementation of `Geocoder` used exclusively for testing. Responses
/// are canned per exact query, so intake-pipeline tests run without a network
/// connection or rate limiting.
#[derive(Debug, Clone, Default)]
pub struct MockGeocoder {
    /// Canned forward-geocoding results, keyed by exact query.
    pub results: HashMap<String, Geocoded>,
    /// Canned reverse-geocoding result.
    pub reverse_address: Option<String>,
    /// When true, all operations return `Unavailable`.
    pub should_fail: bool,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Registers a canned result for an exact query.
    pub fn with_result(mut self, query: &str, result: Geocoded) -> Self {
        self.results.insert(query.to_string(), result);
        self
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn resolve(&self, query: &str) -> Result<Geocoded, GeocodeError> {
        if self.should_fail {
            return Err(GeocodeError::Unavailable("mock outage".to_string()));
        }
        self.results
            .get(query.trim())
            .cloned()
            .ok_or(GeocodeError::NotFound)
    }

    async fn reverse_resolve(&self, _lat: f64, _lon: f64) -> Result<String, GeocodeError> {
        if self.should_fail {
            return Err(GeocodeError::Unavailable("mock outage".to_string()));
        }
        self.reverse_address.clone().ok_or(GeocodeError::NotFound)
    }
}

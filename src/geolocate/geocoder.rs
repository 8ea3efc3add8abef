//! Forward geocoding via the Mapbox Places API.
//!
//! One request per place-name candidate, top result only. A shared
//! rate gate enforces a minimum inter-request interval across every
//! in-flight resolution, and a per-request timeout bounds the call.
//! Every failure mode surfaces as a `GeoError` for the attempt log;
//! nothing here aborts the cascade.

use serde::Deserialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::cache::GeocodeCache;
use super::types::GeoError;

const DEFAULT_ENDPOINT: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum interval between geocoding requests (scheduling contract
/// shared by all concurrent resolutions).
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(100);

/// The top geocoding candidate for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeHit {
    pub lat: f64,
    pub lon: f64,
    pub place_name: String,
    /// Service relevance score in [0, 1].
    pub relevance: f64,
}

/// Seam for the geocoding service, so the resolver can be exercised
/// without network access.
pub trait ForwardGeocoder: Send + Sync {
    fn geocode(&self, query: &str) -> Result<GeocodeHit, GeoError>;
}

/// Map a service relevance score into the geocoding stage's
/// confidence band [0.40, 0.80]. Monotonic in relevance.
pub fn geocode_confidence(relevance: f64) -> f64 {
    (0.40 + 0.40 * relevance).clamp(0.40, 0.80)
}

// ─── Rate gate ──────────────────────────────────────────────────

/// Global minimum-interval gate for outbound geocoding requests.
pub struct RequestGate {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RequestGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    /// Block until the minimum interval since the previous request has
    /// elapsed, then claim the slot. Serializes callers via the lock.
    pub fn wait(&self) {
        let mut last = self.last.lock().unwrap();
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                std::thread::sleep(self.min_interval - elapsed);
            }
        }
        *last = Some(Instant::now());
    }
}

// ─── Mapbox client ──────────────────────────────────────────────

#[derive(Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    features: Vec<GeocodeFeature>,
}

#[derive(Deserialize)]
struct GeocodeFeature {
    geometry: GeocodeGeometry,
    #[serde(default)]
    place_name: Option<String>,
    #[serde(default)]
    relevance: Option<f64>,
}

#[derive(Deserialize)]
struct GeocodeGeometry {
    /// GeoJSON order: [lon, lat].
    coordinates: Vec<f64>,
}

/// Mapbox forward-geocoding client with rate gating and an on-disk
/// query cache. A cache hit skips both the gate and the network.
pub struct MapboxGeocoder {
    token: String,
    endpoint: String,
    gate: RequestGate,
    cache: Mutex<GeocodeCache>,
}

impl MapboxGeocoder {
    pub fn new(token: String, min_interval: Duration) -> Self {
        Self::with_cache(token, min_interval, GeocodeCache::load())
    }

    /// Build with a specific cache (for testing).
    pub fn with_cache(token: String, min_interval: Duration, cache: GeocodeCache) -> Self {
        Self {
            token,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            gate: RequestGate::new(min_interval),
            cache: Mutex::new(cache),
        }
    }

    fn request(&self, query: &str) -> Result<GeocodeResponse, GeoError> {
        let url = format!("{}/{}.json", self.endpoint, urlencode(query));
        let response = ureq::get(&url)
            .query("access_token", &self.token)
            .query("types", "place,locality,neighborhood,address")
            .query("limit", "1")
            .timeout(REQUEST_TIMEOUT)
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => GeoError::Network(format!("HTTP {}", code)),
                e => GeoError::Network(e.to_string()),
            })?;

        response
            .into_json()
            .map_err(|e| GeoError::InvalidResponse(e.to_string()))
    }
}

impl ForwardGeocoder for MapboxGeocoder {
    fn geocode(&self, query: &str) -> Result<GeocodeHit, GeoError> {
        if let Some(hit) = self.cache.lock().unwrap().get(query) {
            return Ok(hit);
        }

        self.gate.wait();
        let response = self.request(query)?;
        let hit = top_hit(query, response)?;
        self.cache.lock().unwrap().put(query, &hit);
        Ok(hit)
    }
}

fn top_hit(query: &str, response: GeocodeResponse) -> Result<GeocodeHit, GeoError> {
    let feature = response
        .features
        .into_iter()
        .next()
        .ok_or_else(|| GeoError::NoResult(query.to_string()))?;

    let [lon, lat] = feature.geometry.coordinates[..] else {
        return Err(GeoError::InvalidResponse(
            "geometry.coordinates is not a [lon, lat] pair".into(),
        ));
    };

    Ok(GeocodeHit {
        lat,
        lon,
        place_name: feature.place_name.unwrap_or_else(|| query.to_string()),
        relevance: feature.relevance.unwrap_or(0.0).clamp(0.0, 1.0),
    })
}

fn urlencode(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            _ if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~') => c.to_string(),
            ' ' => "%20".to_string(),
            _ => c
                .to_string()
                .bytes()
                .map(|b| format!("%{:02X}", b))
                .collect(),
        })
        .collect()
}

//! File-based geocode cache at ~/.telegeo/geocache.json.
//!
//! Keyed by the geocoding query string, case-insensitive. TTL: 30
//! days. Missing fields in older cache files default gracefully.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use super::geocoder::GeocodeHit;

const CACHE_TTL_MS: i64 = 30 * 24 * 3600 * 1000; // 30 days in ms

#[derive(Serialize, Deserialize, Clone)]
struct CacheEntry {
    lat: f64,
    lon: f64,
    place_name: String,
    #[serde(default)]
    relevance: f64,
    timestamp: i64,
}

/// The geocode cache.
pub struct GeocodeCache {
    path: PathBuf,
    entries: HashMap<String, CacheEntry>,
}

impl GeocodeCache {
    /// Load the cache from the default location (~/.telegeo/geocache.json).
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load from a specific path (for testing).
    pub fn load_from(path: PathBuf) -> Self {
        let entries = Self::read_file(&path).unwrap_or_default();
        Self { path, entries }
    }

    fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".telegeo")
            .join("geocache.json")
    }

    fn read_file(path: &PathBuf) -> Option<HashMap<String, CacheEntry>> {
        let data = fs::read_to_string(path).ok()?;
        serde_json::from_str(&data).ok()
    }

    /// Look up a query. Returns None if missing or expired.
    pub fn get(&self, query: &str) -> Option<GeocodeHit> {
        let entry = self.entries.get(&query.to_lowercase())?;

        let now = chrono::Utc::now().timestamp_millis();
        if now - entry.timestamp > CACHE_TTL_MS {
            return None; // expired
        }

        Some(GeocodeHit {
            lat: entry.lat,
            lon: entry.lon,
            place_name: entry.place_name.clone(),
            relevance: entry.relevance,
        })
    }

    /// Store a hit under its query and persist to disk.
    pub fn put(&mut self, query: &str, hit: &GeocodeHit) {
        let entry = CacheEntry {
            lat: hit.lat,
            lon: hit.lon,
            place_name: hit.place_name.clone(),
            relevance: hit.relevance,
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        self.entries.insert(query.to_lowercase(), entry);
        self.persist();
    }

    fn persist(&self) {
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(json) = serde_json::to_string_pretty(&self.entries) {
            let _ = fs::write(&self.path, json);
        }
    }

    /// Number of entries (for testing).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_cache() -> (GeocodeCache, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("geocache.json");
        (GeocodeCache::load_from(path), dir)
    }

    fn kyiv_hit() -> GeocodeHit {
        GeocodeHit {
            lat: 50.4501,
            lon: 30.5234,
            place_name: "Kyiv, Ukraine".into(),
            relevance: 0.9,
        }
    }

    #[test]
    fn test_put_get() {
        let (mut cache, _dir) = test_cache();
        cache.put("Kyiv, Ukraine", &kyiv_hit());

        let hit = cache.get("kyiv, ukraine").unwrap();
        assert_eq!(hit, kyiv_hit());
    }

    #[test]
    fn test_case_insensitive_keys() {
        let (mut cache, _dir) = test_cache();
        cache.put("Kyiv", &kyiv_hit());
        assert!(cache.get("KYIV").is_some());
        assert!(cache.get("kyiv").is_some());
    }

    #[test]
    fn test_miss() {
        let (cache, _dir) = test_cache();
        assert!(cache.get("nonexistent").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("geocache.json");

        {
            let mut cache = GeocodeCache::load_from(path.clone());
            cache.put("Kyiv", &kyiv_hit());
        }

        let cache = GeocodeCache::load_from(path);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("kyiv").is_some());
    }

    #[test]
    fn test_expired_entry_is_miss() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("geocache.json");
        let stale = r#"{
            "kyiv": {
                "lat": 50.4501,
                "lon": 30.5234,
                "place_name": "Kyiv, Ukraine",
                "relevance": 0.9,
                "timestamp": 0
            }
        }"#;
        fs::write(&path, stale).unwrap();

        let cache = GeocodeCache::load_from(path);
        assert!(cache.get("kyiv").is_none());
    }

    #[test]
    fn test_missing_relevance_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("geocache.json");
        let old = format!(
            r#"{{"kyiv": {{"lat": 1.0, "lon": 2.0, "place_name": "Kyiv", "timestamp": {}}}}}"#,
            chrono::Utc::now().timestamp_millis()
        );
        fs::write(&path, old).unwrap();

        let cache = GeocodeCache::load_from(path);
        let hit = cache.get("kyiv").unwrap();
        assert_eq!(hit.relevance, 0.0);
    }
}

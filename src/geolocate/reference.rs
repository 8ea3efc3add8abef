//! Static country reference data.
//!
//! One JSON document maps flag emoji → country, country-name alias →
//! country, country → centroid, channel identifier → country, and the
//! curated known-city list. Loaded once at startup and shared
//! read-only for the process lifetime; a missing or corrupt file is
//! fatal before any message is processed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

const BUNDLED_JSON: &str = include_str!("../../data/countries.json");

/// A country centroid in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub lat: f64,
    pub lon: f64,
}

/// The immutable reference table.
#[derive(Debug, Deserialize)]
pub struct CountryReference {
    flag_to_country: HashMap<String, String>,
    country_centroids: HashMap<String, Centroid>,
    country_aliases: HashMap<String, String>,
    channel_to_country: HashMap<String, String>,
    known_cities: HashMap<String, String>,
}

impl CountryReference {
    /// Load the dataset bundled with the binary.
    pub fn bundled() -> Result<Self, ReferenceError> {
        Self::parse(BUNDLED_JSON)
    }

    /// Load from an external file, overriding the bundled dataset.
    pub fn load(path: &Path) -> Result<Self, ReferenceError> {
        let data = fs::read_to_string(path)
            .map_err(|e| ReferenceError::Io(path.display().to_string(), e.to_string()))?;
        Self::parse(&data)
    }

    fn parse(data: &str) -> Result<Self, ReferenceError> {
        let reference: Self =
            serde_json::from_str(data).map_err(|e| ReferenceError::Parse(e.to_string()))?;
        reference.validate()?;
        Ok(reference)
    }

    /// Every country referenced anywhere must have a centroid.
    fn validate(&self) -> Result<(), ReferenceError> {
        let referenced = self
            .flag_to_country
            .values()
            .chain(self.country_aliases.values())
            .chain(self.channel_to_country.values())
            .chain(self.known_cities.values());
        for code in referenced {
            if !self.country_centroids.contains_key(code) {
                return Err(ReferenceError::MissingCentroid(code.clone()));
            }
        }
        Ok(())
    }

    pub fn country_for_flag(&self, flag: &str) -> Option<&str> {
        self.flag_to_country.get(flag).map(String::as_str)
    }

    /// Look up a country name or alias (case-insensitive).
    pub fn country_for_alias(&self, name: &str) -> Option<&str> {
        self.country_aliases
            .get(&name.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn country_for_channel(&self, channel: &str) -> Option<&str> {
        self.channel_to_country.get(channel).map(String::as_str)
    }

    /// Look up a curated city name (case-insensitive).
    pub fn country_for_city(&self, city: &str) -> Option<&str> {
        self.known_cities
            .get(&city.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn centroid(&self, country_code: &str) -> Option<Centroid> {
        self.country_centroids.get(country_code).copied()
    }

    /// Iterate the curated city list as (lowercase name, country code).
    pub fn known_cities(&self) -> impl Iterator<Item = (&str, &str)> {
        self.known_cities
            .iter()
            .map(|(name, code)| (name.as_str(), code.as_str()))
    }
}

/// Reference-data loading errors. All fatal at startup.
#[derive(Debug)]
pub enum ReferenceError {
    Io(String, String),
    Parse(String),
    MissingCentroid(String),
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(path, msg) => write!(f, "cannot read reference data '{}': {}", path, msg),
            Self::Parse(msg) => write!(f, "corrupt reference data: {}", msg),
            Self::MissingCentroid(code) => {
                write!(f, "reference data references '{}' without a centroid", code)
            }
        }
    }
}

impl std::error::Error for ReferenceError {}

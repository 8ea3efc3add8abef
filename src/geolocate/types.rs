//! Core types for the geolocation subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One strategy in the fixed-priority resolution cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Coordinates,
    FlagEmoji,
    EntityExtraction,
    Geocoding,
    ChannelFallback,
}

impl Stage {
    /// Stage identifier as recorded in the attempt log.
    pub fn name(self) -> &'static str {
        match self {
            Self::Coordinates => "coordinates_regex",
            Self::FlagEmoji => "flag_emoji",
            Self::EntityExtraction => "entity_extraction",
            Self::Geocoding => "llm_geocoding",
            Self::ChannelFallback => "channel_fallback",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a single stage attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptOutcome {
    Success,
    Miss,
    Error,
}

/// One entry in the per-message audit trail. Append-only, ordered by
/// stage execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoAttempt {
    pub stage: String,
    pub outcome: AttemptOutcome,
    pub detail: String,
}

impl GeoAttempt {
    pub fn new(stage: Stage, outcome: AttemptOutcome, detail: impl Into<String>) -> Self {
        Self {
            stage: stage.name().to_string(),
            outcome,
            detail: detail.into(),
        }
    }
}

/// A resolved geolocation with confidence and provenance.
///
/// `confidence` is a fixed per-stage constant except for geocoded
/// results, where it is derived from the service's relevance score.
/// Downstream consumers depend on the exact constants and source tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geolocation {
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    pub confidence: f64,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
    #[serde(default)]
    pub geocoding_attempts: Vec<GeoAttempt>,
}

/// The full outcome of resolving one message: the geolocation (if any
/// stage succeeded) plus the ordered attempt log, which is preserved
/// even when every stage missed.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub geolocation: Option<Geolocation>,
    pub attempts: Vec<GeoAttempt>,
}

impl Resolution {
    pub fn resolved(&self) -> bool {
        self.geolocation.is_some()
    }
}

/// Geocoding service errors. None of these escalate past the resolver;
/// they are recorded in the attempt log and the cascade falls through.
#[derive(Debug)]
pub enum GeoError {
    Network(String),
    InvalidResponse(String),
    NoResult(String),
    Disabled,
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "network error: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "invalid geocoding response: {}", msg),
            Self::NoResult(q) => write!(f, "empty result set for '{}'", q),
            Self::Disabled => write!(f, "geocoding disabled (offline mode)"),
        }
    }
}

impl std::error::Error for GeoError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Coordinates.name(), "coordinates_regex");
        assert_eq!(Stage::FlagEmoji.name(), "flag_emoji");
        assert_eq!(Stage::ChannelFallback.name(), "channel_fallback");
    }

    #[test]
    fn test_attempt_outcome_serializes_lowercase() {
        let attempt = GeoAttempt::new(Stage::Geocoding, AttemptOutcome::Error, "timeout");
        let json = serde_json::to_value(&attempt).unwrap();
        assert_eq!(json["outcome"], "error");
        assert_eq!(json["stage"], "llm_geocoding");
    }

    #[test]
    fn test_geolocation_omits_empty_optionals() {
        let geo = Geolocation {
            lat: 1.0,
            lon: 2.0,
            country_code: None,
            confidence: 0.95,
            source: "coordinates_regex".into(),
            place_name: None,
            geocoding_attempts: vec![],
        };
        let json = serde_json::to_value(&geo).unwrap();
        assert!(json.get("country_code").is_none());
        assert!(json.get("place_name").is_none());
    }
}

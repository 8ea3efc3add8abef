//! Geolocation resolver — the five-stage cascade.
//!
//! Stage order: coordinates → flag emoji → entity extraction →
//! geocoding → channel fallback. Each stage runs only on the previous
//! stage's miss; the first success wins and its confidence and source
//! tag are recorded. Every stage tried appends exactly one attempt to
//! the audit log, which survives even a total miss.

use std::sync::Arc;

use super::coordinates::extract_coordinates;
use super::entities::{extract_candidate, LocationCandidate};
use super::flags::{first_flag, flag_letters};
use super::geocoder::{geocode_confidence, ForwardGeocoder};
use super::reference::CountryReference;
use super::types::{AttemptOutcome, GeoAttempt, Geolocation, Resolution, Stage};
use crate::message::Message;

const COORDINATES_CONFIDENCE: f64 = 0.95;
const FLAG_CONFIDENCE: f64 = 0.85;
const CHANNEL_FALLBACK_CONFIDENCE: f64 = 0.20;

/// Where the cascade goes after a stage completes.
enum Transition {
    Resolved(Geolocation),
    Advance(Stage),
    Unresolved,
}

/// The multi-stage resolver. Pure given its read-only reference table;
/// the geocoder is the single external collaborator and is absent in
/// offline mode.
pub struct GeoResolver {
    reference: Arc<CountryReference>,
    geocoder: Option<Box<dyn ForwardGeocoder>>,
}

impl GeoResolver {
    /// Offline resolver: the geocoding stage records an error attempt
    /// and falls through.
    pub fn new(reference: Arc<CountryReference>) -> Self {
        Self {
            reference,
            geocoder: None,
        }
    }

    pub fn with_geocoder(
        reference: Arc<CountryReference>,
        geocoder: Box<dyn ForwardGeocoder>,
    ) -> Self {
        Self {
            reference,
            geocoder: Some(geocoder),
        }
    }

    /// Resolve one message. Returns the geolocation of the first
    /// successful stage (or none) plus the full attempt log.
    pub fn resolve(&self, message: &Message) -> Resolution {
        let text = message.scan_text();
        let mut attempts: Vec<GeoAttempt> = Vec::new();
        let mut candidate: Option<LocationCandidate> = None;
        let mut stage = Stage::Coordinates;

        loop {
            let transition = match stage {
                Stage::Coordinates => self.try_coordinates(&text, &mut attempts),
                Stage::FlagEmoji => self.try_flag(&text, &mut attempts),
                Stage::EntityExtraction => self.try_entities(&text, &mut candidate, &mut attempts),
                Stage::Geocoding => self.try_geocoding(candidate.as_ref(), &mut attempts),
                Stage::ChannelFallback => self.try_channel(&message.channel, &mut attempts),
            };

            match transition {
                Transition::Resolved(mut geolocation) => {
                    geolocation.geocoding_attempts = attempts.clone();
                    return Resolution {
                        geolocation: Some(geolocation),
                        attempts,
                    };
                }
                Transition::Advance(next) => stage = next,
                Transition::Unresolved => {
                    return Resolution {
                        geolocation: None,
                        attempts,
                    };
                }
            }
        }
    }

    fn try_coordinates(&self, text: &str, attempts: &mut Vec<GeoAttempt>) -> Transition {
        match extract_coordinates(text) {
            Some((lat, lon)) => {
                attempts.push(GeoAttempt::new(
                    Stage::Coordinates,
                    AttemptOutcome::Success,
                    format!("matched {}, {}", lat, lon),
                ));
                Transition::Resolved(Geolocation {
                    lat,
                    lon,
                    country_code: None,
                    confidence: COORDINATES_CONFIDENCE,
                    source: Stage::Coordinates.name().to_string(),
                    place_name: None,
                    geocoding_attempts: vec![],
                })
            }
            None => {
                attempts.push(GeoAttempt::new(
                    Stage::Coordinates,
                    AttemptOutcome::Miss,
                    "no coordinate pattern",
                ));
                Transition::Advance(Stage::FlagEmoji)
            }
        }
    }

    fn try_flag(&self, text: &str, attempts: &mut Vec<GeoAttempt>) -> Transition {
        let Some(flag) = first_flag(text) else {
            attempts.push(GeoAttempt::new(
                Stage::FlagEmoji,
                AttemptOutcome::Miss,
                "no flag emoji",
            ));
            return Transition::Advance(Stage::EntityExtraction);
        };

        let resolved = self
            .reference
            .country_for_flag(&flag)
            .and_then(|code| self.reference.centroid(code).map(|c| (code.to_string(), c)));

        match resolved {
            Some((code, centroid)) => {
                attempts.push(GeoAttempt::new(
                    Stage::FlagEmoji,
                    AttemptOutcome::Success,
                    format!("flag {} → {}", flag_letters(&flag), code),
                ));
                Transition::Resolved(Geolocation {
                    lat: centroid.lat,
                    lon: centroid.lon,
                    country_code: Some(code),
                    confidence: FLAG_CONFIDENCE,
                    source: Stage::FlagEmoji.name().to_string(),
                    place_name: None,
                    geocoding_attempts: vec![],
                })
            }
            None => {
                attempts.push(GeoAttempt::new(
                    Stage::FlagEmoji,
                    AttemptOutcome::Miss,
                    format!("unrecognized flag {}", flag_letters(&flag)),
                ));
                Transition::Advance(Stage::EntityExtraction)
            }
        }
    }

    fn try_entities(
        &self,
        text: &str,
        candidate: &mut Option<LocationCandidate>,
        attempts: &mut Vec<GeoAttempt>,
    ) -> Transition {
        match extract_candidate(text, &self.reference) {
            Some(found) => {
                attempts.push(GeoAttempt::new(
                    Stage::EntityExtraction,
                    AttemptOutcome::Success,
                    format!(
                        "extracted '{}' ({}, provisional {:.2})",
                        found.query,
                        found.pattern.label(),
                        found.pattern.provisional_confidence(),
                    ),
                ));
                *candidate = Some(found);
                Transition::Advance(Stage::Geocoding)
            }
            None => {
                attempts.push(GeoAttempt::new(
                    Stage::EntityExtraction,
                    AttemptOutcome::Miss,
                    "no place-name pattern",
                ));
                // Geocoding never runs on empty input.
                Transition::Advance(Stage::ChannelFallback)
            }
        }
    }

    fn try_geocoding(
        &self,
        candidate: Option<&LocationCandidate>,
        attempts: &mut Vec<GeoAttempt>,
    ) -> Transition {
        // The entity stage always runs first; a missing candidate here
        // would be an orchestration bug, not a data condition.
        let Some(candidate) = candidate else {
            attempts.push(GeoAttempt::new(
                Stage::Geocoding,
                AttemptOutcome::Error,
                "no candidate from entity extraction",
            ));
            return Transition::Advance(Stage::ChannelFallback);
        };

        let result = match &self.geocoder {
            Some(geocoder) => geocoder.geocode(&candidate.query),
            None => Err(super::types::GeoError::Disabled),
        };

        match result {
            Ok(hit) => {
                attempts.push(GeoAttempt::new(
                    Stage::Geocoding,
                    AttemptOutcome::Success,
                    format!("geocoded '{}' (relevance {:.2})", hit.place_name, hit.relevance),
                ));
                Transition::Resolved(Geolocation {
                    lat: hit.lat,
                    lon: hit.lon,
                    country_code: candidate.country_code.clone(),
                    confidence: geocode_confidence(hit.relevance),
                    source: candidate.pattern.source_tag().to_string(),
                    place_name: Some(hit.place_name),
                    geocoding_attempts: vec![],
                })
            }
            Err(e) => {
                attempts.push(GeoAttempt::new(
                    Stage::Geocoding,
                    AttemptOutcome::Error,
                    e.to_string(),
                ));
                Transition::Advance(Stage::ChannelFallback)
            }
        }
    }

    fn try_channel(&self, channel: &str, attempts: &mut Vec<GeoAttempt>) -> Transition {
        let resolved = self
            .reference
            .country_for_channel(channel)
            .and_then(|code| self.reference.centroid(code).map(|c| (code.to_string(), c)));

        match resolved {
            Some((code, centroid)) => {
                attempts.push(GeoAttempt::new(
                    Stage::ChannelFallback,
                    AttemptOutcome::Success,
                    format!("channel '{}' → {}", channel, code),
                ));
                Transition::Resolved(Geolocation {
                    lat: centroid.lat,
                    lon: centroid.lon,
                    country_code: Some(code),
                    confidence: CHANNEL_FALLBACK_CONFIDENCE,
                    source: Stage::ChannelFallback.name().to_string(),
                    place_name: None,
                    geocoding_attempts: vec![],
                })
            }
            None => {
                attempts.push(GeoAttempt::new(
                    Stage::ChannelFallback,
                    AttemptOutcome::Miss,
                    format!("channel '{}' unmapped", channel),
                ));
                Transition::Unresolved
            }
        }
    }
}

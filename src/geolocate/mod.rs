//! Geolocation subsystem for telegeo.
//!
//! Provides the five-stage resolution cascade (coordinate extraction,
//! flag emoji, entity extraction, forward geocoding, channel fallback),
//! the static country reference table, and the geocode cache.

pub mod cache;
pub mod coordinates;
pub mod entities;
pub mod flags;
pub mod geocoder;
pub mod reference;
pub mod resolver;
pub mod types;

pub use geocoder::{ForwardGeocoder, GeocodeHit, MapboxGeocoder, DEFAULT_MIN_INTERVAL};
pub use reference::{Centroid, CountryReference, ReferenceError};
pub use resolver::GeoResolver;
pub use types::{AttemptOutcome, GeoAttempt, GeoError, Geolocation, Resolution, Stage};

//! telegeo — geolocation ETL for public Telegram channel feeds.
//!
//! Takes extracted channel messages (JSONL), assigns each a
//! best-effort coordinate through a five-stage resolution cascade with
//! per-stage confidence and a full attempt audit trail, and emits
//! enriched JSONL plus a GeoJSON feed for the map front end.

pub mod geojson;
pub mod geolocate;
pub mod message;
pub mod pipeline;
pub mod server;

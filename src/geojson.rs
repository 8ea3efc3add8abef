//! Enriched JSONL → GeoJSON conversion.
//!
//! Produces one FeatureCollection per enriched file plus a combined
//! feed consumed by the map front end. Coordinates follow GeoJSON
//! order, [lon, lat]. Records without a geolocation are counted but
//! emit no feature.

use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::pipeline::{jsonl_files, PipelineError};

/// Combined feed filename, fixed for downstream consumers.
pub const COMBINED_FEED: &str = "combined_telegram_data.geojson";

const TEXT_LIMIT: usize = 300;

#[derive(Debug, Clone, Copy, Default)]
pub struct GeojsonStats {
    pub total: usize,
    pub geolocated: usize,
}

/// Build a GeoJSON feature from one enriched record, or None when the
/// record carries no geolocation.
pub fn feature_from_record(record: &Value) -> Option<Value> {
    let geolocation = record.get("geolocation")?;
    let lat = geolocation.get("lat")?.as_f64()?;
    let lon = geolocation.get("lon")?.as_f64()?;

    let text: String = record
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or("")
        .chars()
        .take(TEXT_LIMIT)
        .collect();

    Some(json!({
        "type": "Feature",
        "geometry": {
            "type": "Point",
            "coordinates": [lon, lat],
        },
        "properties": {
            "id": record.get("id").cloned().unwrap_or(Value::Null),
            "date": record.get("date").or_else(|| record.get("timestamp")).cloned().unwrap_or(Value::Null),
            "text": text,
            "link": record.get("link").cloned().unwrap_or(Value::Null),
            "channel": record.get("channel").cloned().unwrap_or(Value::Null),
            "views": record.get("views").cloned().unwrap_or(Value::Null),
            "forwards": record.get("forwards").cloned().unwrap_or(Value::Null),
            "geolocation": {
                "confidence": geolocation.get("confidence").cloned().unwrap_or(Value::Null),
                "source": geolocation.get("source").cloned().unwrap_or(Value::Null),
                "place_name": geolocation.get("place_name").cloned().unwrap_or(Value::Null),
                "country_code": geolocation.get("country_code").cloned().unwrap_or(Value::Null),
                "geocoding_attempts": geolocation.get("geocoding_attempts").cloned().unwrap_or_else(|| json!([])),
            },
            "processed_at": record.get("processed_at").cloned().unwrap_or(Value::Null),
            "processing_version": record.get("processing_version").cloned().unwrap_or(Value::Null),
        },
    }))
}

fn collection(features: Vec<Value>, stats: GeojsonStats, extra: Value) -> Value {
    let mut properties = json!({
        "processed_at": chrono::Utc::now().to_rfc3339(),
        "total_messages": stats.total,
        "geolocated_messages": stats.geolocated,
        "geolocation_rate": format!(
            "{:.1}%",
            if stats.total == 0 { 0.0 } else { stats.geolocated as f64 / stats.total as f64 * 100.0 }
        ),
    });
    if let (Some(props), Some(add)) = (properties.as_object_mut(), extra.as_object()) {
        for (k, v) in add {
            props.insert(k.clone(), v.clone());
        }
    }

    json!({
        "type": "FeatureCollection",
        "features": features,
        "properties": properties,
    })
}

fn read_features(input: &Path) -> Result<(Vec<Value>, GeojsonStats), PipelineError> {
    let reader = BufReader::new(
        File::open(input).map_err(|e| PipelineError::Io(input.to_path_buf(), e.to_string()))?,
    );

    let mut features = Vec::new();
    let mut stats = GeojsonStats::default();

    for line in reader.lines() {
        let line = line.map_err(|e| PipelineError::Io(input.to_path_buf(), e.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let Ok(record) = serde_json::from_str::<Value>(&line) else {
            continue;
        };
        stats.total += 1;
        if let Some(feature) = feature_from_record(&record) {
            features.push(feature);
            stats.geolocated += 1;
        }
    }

    Ok((features, stats))
}

fn write_collection(path: &Path, value: &Value) -> Result<(), PipelineError> {
    let pretty = serde_json::to_string_pretty(value)
        .map_err(|e| PipelineError::Io(path.to_path_buf(), e.to_string()))?;
    fs::write(path, pretty).map_err(|e| PipelineError::Io(path.to_path_buf(), e.to_string()))
}

/// Convert one enriched JSONL file to a GeoJSON file.
pub fn jsonl_to_geojson(input: &Path, output: &Path) -> Result<GeojsonStats, PipelineError> {
    let (features, stats) = read_features(input)?;
    let geojson = collection(
        features,
        stats,
        json!({ "source_file": input.display().to_string() }),
    );
    write_collection(output, &geojson)?;
    Ok(stats)
}

/// Convert every `enhanced_*.jsonl` file in `input_dir`, then write the
/// combined feed.
pub fn convert_dir(input_dir: &Path, output_dir: &Path) -> Result<GeojsonStats, PipelineError> {
    fs::create_dir_all(output_dir)
        .map_err(|e| PipelineError::Io(output_dir.to_path_buf(), e.to_string()))?;

    let mut inputs: Vec<_> = jsonl_files(input_dir)?
        .into_iter()
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().starts_with("enhanced_"))
                .unwrap_or(false)
        })
        .collect();
    inputs.sort();

    let mut all_features = Vec::new();
    let mut total = GeojsonStats::default();
    let mut source_files = Vec::new();

    for input in &inputs {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let out_name = name
            .trim_start_matches("enhanced_")
            .trim_end_matches(".jsonl")
            .to_string()
            + ".geojson";

        let (features, stats) = read_features(input)?;
        let geojson = collection(features.clone(), stats, json!({ "source_file": name }));
        write_collection(&output_dir.join(out_name), &geojson)?;

        all_features.extend(features);
        total.total += stats.total;
        total.geolocated += stats.geolocated;
        source_files.push(name);
    }

    let combined = collection(all_features, total, json!({ "source_files": source_files }));
    write_collection(&output_dir.join(COMBINED_FEED), &combined)?;

    Ok(total)
}

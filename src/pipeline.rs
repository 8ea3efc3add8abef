//! JSONL transform pipeline.
//!
//! Reads extraction output (one JSON message per line), resolves each
//! message, and writes the enriched record: original fields preserved
//! verbatim plus `geolocation` (omitted when unresolved), the attempt
//! log, `processed_at`, and `processing_version`. A malformed line is
//! skipped with a warning; no message ever aborts the batch.

use serde_json::Value;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::geolocate::GeoResolver;
use crate::message::Message;

/// Version tag stamped on every enriched record.
pub const PROCESSING_VERSION: &str = "telegeo_v1";

/// Per-run counters.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct PipelineStats {
    pub processed: usize,
    pub geolocated: usize,
    pub skipped: usize,
}

impl PipelineStats {
    fn absorb(&mut self, other: PipelineStats) {
        self.processed += other.processed;
        self.geolocated += other.geolocated;
        self.skipped += other.skipped;
    }

    pub fn rate(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            self.geolocated as f64 / self.processed as f64 * 100.0
        }
    }
}

#[derive(Debug)]
pub enum PipelineError {
    Io(PathBuf, String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(path, msg) => write!(f, "{}: {}", path.display(), msg),
        }
    }
}

impl std::error::Error for PipelineError {}

fn io_err(path: &Path, e: std::io::Error) -> PipelineError {
    PipelineError::Io(path.to_path_buf(), e.to_string())
}

/// Enrich one record in place. Returns true when a geolocation was
/// attached, or the deserialization error when the record is not a
/// readable message (type-mismatched fields). Callers must not write
/// an errored record through unstamped.
pub fn enrich_record(
    resolver: &GeoResolver,
    record: &mut Value,
) -> Result<bool, serde_json::Error> {
    let message: Message = serde_json::from_value(record.clone())?;

    let resolution = resolver.resolve(&message);
    let resolved = resolution.resolved();

    let Some(obj) = record.as_object_mut() else {
        return Ok(false);
    };
    match resolution.geolocation {
        Some(geolocation) => {
            obj.insert(
                "geolocation".into(),
                serde_json::to_value(geolocation).unwrap_or(Value::Null),
            );
        }
        None => {
            // No geolocation field at all, but the audit trail survives.
            obj.insert(
                "geolocation_attempts".into(),
                serde_json::to_value(&resolution.attempts).unwrap_or(Value::Null),
            );
        }
    }
    obj.insert(
        "processed_at".into(),
        Value::String(chrono::Utc::now().to_rfc3339()),
    );
    obj.insert(
        "processing_version".into(),
        Value::String(PROCESSING_VERSION.to_string()),
    );

    Ok(resolved)
}

/// Process a single JSONL file into an enriched JSONL file.
pub fn process_file(
    resolver: &GeoResolver,
    input: &Path,
    output: &Path,
) -> Result<PipelineStats, PipelineError> {
    let reader = BufReader::new(File::open(input).map_err(|e| io_err(input, e))?);
    let mut writer = BufWriter::new(File::create(output).map_err(|e| io_err(output, e))?);

    let mut stats = PipelineStats::default();

    for line in reader.lines() {
        let line = line.map_err(|e| io_err(input, e))?;
        if line.trim().is_empty() {
            continue;
        }

        let mut record: Value = match serde_json::from_str(&line) {
            Ok(v @ Value::Object(_)) => v,
            Ok(_) | Err(_) => {
                eprintln!("  Warning: skipping malformed line in {}", input.display());
                stats.skipped += 1;
                continue;
            }
        };

        match enrich_record(resolver, &mut record) {
            Ok(resolved) => {
                if resolved {
                    stats.geolocated += 1;
                }
                stats.processed += 1;
            }
            Err(e) => {
                eprintln!(
                    "  Warning: skipping unreadable record in {}: {}",
                    input.display(),
                    e
                );
                stats.skipped += 1;
                continue;
            }
        }

        serde_json::to_writer(&mut writer, &record).map_err(|e| {
            PipelineError::Io(output.to_path_buf(), e.to_string())
        })?;
        writer.write_all(b"\n").map_err(|e| io_err(output, e))?;
    }

    writer.flush().map_err(|e| io_err(output, e))?;
    Ok(stats)
}

/// Process every `*.jsonl` file in `input_dir` into
/// `enhanced_<name>.jsonl` files in `output_dir`.
pub fn process_dir(
    resolver: &GeoResolver,
    input_dir: &Path,
    output_dir: &Path,
) -> Result<PipelineStats, PipelineError> {
    fs::create_dir_all(output_dir).map_err(|e| io_err(output_dir, e))?;

    let mut inputs = jsonl_files(input_dir)?;
    inputs.sort();

    let mut total = PipelineStats::default();
    for input in inputs {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output = output_dir.join(format!("enhanced_{}", name));

        eprintln!("  Processing {}...", name);
        let stats = process_file(resolver, &input, &output)?;
        eprintln!(
            "    {} messages, {} geolocated ({:.1}%)",
            stats.processed,
            stats.geolocated,
            stats.rate()
        );
        total.absorb(stats);
    }

    Ok(total)
}

pub(crate) fn jsonl_files(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let entries = fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| io_err(dir, e))?.path();
        if path.extension().is_some_and(|ext| ext == "jsonl") {
            files.push(path);
        }
    }
    Ok(files)
}

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use telegeo::geojson;
use telegeo::geolocate::{CountryReference, GeoResolver, MapboxGeocoder};
use telegeo::pipeline;
use telegeo::server;

/// telegeo — geolocation ETL for public Telegram channel feeds.
///
/// Reads extracted messages from JSONL, resolves a best-effort
/// location for each through the five-stage cascade, and writes
/// enriched JSONL plus a GeoJSON feed for the map front end.
///
/// Examples:
///   telegeo
///   telegeo --input-dir data/unprocessed --output-dir data/processed
///   telegeo --offline
///   telegeo --serve --port 8001
#[derive(Parser)]
#[command(name = "telegeo", version, about, long_about = None)]
struct Cli {
    /// Directory of extracted *.jsonl files.
    #[arg(long, default_value = "data/unprocessed")]
    input_dir: PathBuf,

    /// Directory for enriched enhanced_*.jsonl files.
    #[arg(long, default_value = "data/processed")]
    output_dir: PathBuf,

    /// Directory for generated GeoJSON files.
    #[arg(long, default_value = "data/geojson")]
    geojson_dir: PathBuf,

    /// Country reference data file (defaults to the bundled dataset).
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Minimum interval between geocoding requests, in milliseconds.
    #[arg(long, default_value_t = 100)]
    min_interval_ms: u64,

    /// Offline mode: no geocoding calls; the geocoding stage records
    /// an error attempt and falls through.
    #[arg(long)]
    offline: bool,

    /// Skip GeoJSON generation after the transform.
    #[arg(long)]
    skip_geojson: bool,

    /// Serve the GeoJSON feed over HTTP after processing.
    #[arg(long)]
    serve: bool,

    /// Feed server bind host.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Feed server port.
    #[arg(long, default_value_t = 8001)]
    port: u16,
}

fn main() {
    let cli = Cli::parse();

    // ── Load reference data (fatal if missing or corrupt) ──────

    let reference = match &cli.reference {
        Some(path) => CountryReference::load(path),
        None => CountryReference::bundled(),
    }
    .unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let reference = Arc::new(reference);

    // ── Build the resolver ─────────────────────────────────────

    let resolver = if cli.offline {
        GeoResolver::new(reference)
    } else {
        let token = std::env::var("MAPBOX_ACCESS_TOKEN").unwrap_or_else(|_| {
            eprintln!("Error: MAPBOX_ACCESS_TOKEN not set. Export it or run with --offline.");
            std::process::exit(1);
        });
        let geocoder = MapboxGeocoder::new(token, Duration::from_millis(cli.min_interval_ms));
        GeoResolver::with_geocoder(reference, Box::new(geocoder))
    };

    // ── Transform ──────────────────────────────────────────────

    let stats =
        pipeline::process_dir(&resolver, &cli.input_dir, &cli.output_dir).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    eprintln!(
        "  Total: {} messages, {} geolocated ({:.1}%), {} skipped",
        stats.processed,
        stats.geolocated,
        stats.rate(),
        stats.skipped,
    );

    // ── GeoJSON feed ───────────────────────────────────────────

    if !cli.skip_geojson {
        let geo_stats =
            geojson::convert_dir(&cli.output_dir, &cli.geojson_dir).unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            });
        eprintln!(
            "  GeoJSON: {} features written to {}",
            geo_stats.geolocated,
            cli.geojson_dir.display(),
        );
    }

    // ── Feed server ────────────────────────────────────────────

    if cli.serve {
        let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("Error: Cannot start runtime: {}", e);
            std::process::exit(1);
        });
        runtime.block_on(server::start(&cli.host, cli.port, cli.geojson_dir, stats));
    }
}

use crate::pipeline::PipelineStats;
use std::path::PathBuf;

pub struct AppState {
    /// Directory holding the generated GeoJSON files.
    pub geojson_dir: PathBuf,
    /// Counters from the transform run that produced the feed.
    pub stats: PipelineStats,
}

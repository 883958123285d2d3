mod geometry;
mod identity;
mod parser;
mod paths;
mod pipeline;
mod scan;
mod store;
mod totals;
mod types;

pub use geometry::build_multilinestring;
pub use identity::content_hash;
pub use parser::{
    TrackDocument, format_timestamp, normalize_timestamp, parse_timestamp, parse_track_document,
};
pub use paths::{
    DEFAULT_FILENAME, DEFAULT_UPLOAD_PREFIX, HASH_PREFIX_LEN, derive_storage_key,
    sanitize_filename, short_hash,
};
pub use pipeline::{IngestPipeline, PreparedRun, parse_track, prepare_run};
pub use scan::{FileReport, collect_track_files, is_track_path, prepare_files};
pub use store::{ContentStore, FsContentStore, MetadataStore, StoreError};
pub use totals::{
    EARTH_RADIUS_METERS, RunMetrics, duration_seconds, haversine_meters, resolve_field,
    segment_distance_meters, total_distance_meters,
};
pub use types::{
    IngestError, IngestErrorKind, IngestIssue, IngestResult, PipelineConfig, ReferenceRequest,
    Result, RunOverrides, ScanResult, UploadRequest,
};

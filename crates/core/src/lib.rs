use serde::{Deserialize, Serialize};

/// A single recorded position. Coordinates are WGS84 degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: Option<String>,
}

impl TrackPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackSegment {
    pub points: Vec<TrackPoint>,
}

impl TrackSegment {
    pub fn new(points: Vec<TrackPoint>) -> Self {
        Self { points }
    }

    /// Segments with fewer than two points carry no line and are left out of geometry.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub segments: Vec<TrackSegment>,
}

impl Track {
    pub fn new(segments: Vec<TrackSegment>) -> Self {
        Self { segments }
    }
}

/// Result of parsing one track document.
///
/// `first_timestamp`/`last_timestamp` are taken verbatim in document order,
/// including points that were dropped for missing coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedTrack {
    pub tracks: Vec<Track>,
    pub first_timestamp: Option<String>,
    pub last_timestamp: Option<String>,
    pub total_distance_meters: f64,
}

impl ParsedTrack {
    pub fn segments(&self) -> impl Iterator<Item = &TrackSegment> {
        self.tracks.iter().flat_map(|track| track.segments.iter())
    }

    pub fn segment_count(&self) -> usize {
        self.segments().count()
    }

    pub fn point_count(&self) -> usize {
        self.segments().map(|segment| segment.points.len()).sum()
    }
}

/// Payload for the metadata store insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRun {
    pub wkt: String,
    pub start_time: Option<String>,
    pub duration_s: Option<i64>,
    pub distance_km: Option<f64>,
    pub source_file: String,
    pub content_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: i64,
    pub wkt: String,
    pub start_time: Option<String>,
    pub duration_s: Option<i64>,
    pub distance_km: Option<f64>,
    pub source_file: String,
    pub content_hash: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub run_count: u64,
    pub total_distance_km: f64,
    pub total_duration_s: i64,
    pub first_start: Option<String>,
    pub last_start: Option<String>,
}

use runmap_core::{Track, TrackSegment};

use crate::types::{IngestError, Result};

fn segment_wkt(segment: &TrackSegment) -> String {
    let coords = segment
        .points
        .iter()
        .map(|point| format!("{} {}", point.longitude, point.latitude))
        .collect::<Vec<_>>()
        .join(", ");
    format!("({coords})")
}

/// Encodes every qualifying segment as one `MULTILINESTRING` part, in document order.
///
/// Coordinates are written longitude first. Points are emitted as parsed: no
/// reprojection, simplification or removal of repeated points.
pub fn build_multilinestring(tracks: &[Track]) -> Result<String> {
    let parts = tracks
        .iter()
        .flat_map(|track| track.segments.iter())
        .filter(|segment| !segment.is_degenerate())
        .map(segment_wkt)
        .collect::<Vec<_>>();
    if parts.is_empty() {
        return Err(IngestError::GeometryEmpty);
    }
    Ok(format!("MULTILINESTRING({})", parts.join(", ")))
}

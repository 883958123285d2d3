use runmap_core::{ParsedTrack, Track, TrackPoint, TrackSegment};
use serde::Serialize;

use crate::parser::{format_timestamp, parse_timestamp};
use crate::types::RunOverrides;

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two points on a sphere of [`EARTH_RADIUS_METERS`].
pub fn haversine_meters(a: &TrackPoint, b: &TrackPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}

/// Sum of the legs between consecutive points of one segment.
pub fn segment_distance_meters(segment: &TrackSegment) -> f64 {
    segment
        .points
        .windows(2)
        .map(|pair| haversine_meters(&pair[0], &pair[1]))
        .sum()
}

/// Distance over all segments. No leg is counted across a segment boundary.
pub fn total_distance_meters(tracks: &[Track]) -> f64 {
    tracks
        .iter()
        .flat_map(|track| track.segments.iter())
        .map(segment_distance_meters)
        .sum()
}

/// Whole seconds from `first` to `last`, rounded and clamped at zero.
///
/// `None` when either timestamp cannot be parsed.
pub fn duration_seconds(first: &str, last: &str) -> Option<i64> {
    let first = parse_timestamp(first)?;
    let last = parse_timestamp(last)?;
    let millis = (last - first).num_milliseconds();
    let seconds = (millis as f64 / 1000.0).round() as i64;
    Some(seconds.max(0))
}

/// Start time, duration and distance for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunMetrics {
    pub start_time: Option<String>,
    pub duration_s: Option<i64>,
    pub distance_km: Option<f64>,
}

impl RunMetrics {
    /// Values derived from the track itself.
    pub fn from_parsed(parsed: &ParsedTrack) -> Self {
        let start = parsed.first_timestamp.as_deref().and_then(parse_timestamp);
        let duration_s = match (
            parsed.first_timestamp.as_deref(),
            parsed.last_timestamp.as_deref(),
        ) {
            (Some(first), Some(last)) => duration_seconds(first, last),
            _ => None,
        };
        Self {
            start_time: start.map(format_timestamp),
            duration_s,
            distance_km: Some(parsed.total_distance_meters / 1000.0),
        }
    }
}

impl RunOverrides {
    /// Applies caller overrides; each field falls back to its inferred value on its own.
    pub fn resolve(&self, inferred: &RunMetrics) -> RunMetrics {
        RunMetrics {
            start_time: resolve_field(
                self.start_time.map(format_timestamp),
                inferred.start_time.clone(),
            ),
            duration_s: resolve_field(self.duration_s, inferred.duration_s),
            distance_km: resolve_field(self.distance_km, inferred.distance_km),
        }
    }
}

pub fn resolve_field<T>(explicit: Option<T>, inferred: Option<T>) -> Option<T> {
    explicit.or(inferred)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn segment(points: &[(f64, f64)]) -> TrackSegment {
        TrackSegment::new(
            points
                .iter()
                .map(|(lat, lon)| TrackPoint::new(*lat, *lon))
                .collect(),
        )
    }

    #[test]
    fn haversine_matches_known_distance() {
        let a = TrackPoint::new(38.0, -121.0);
        let b = TrackPoint::new(38.001, -121.0);
        let dist = haversine_meters(&a, &b);
        assert!((dist - 111.19).abs() < 0.01, "got {dist}");

        let equator = haversine_meters(&TrackPoint::new(0.0, 0.0), &TrackPoint::new(0.0, 1.0));
        assert!((equator - 111_194.93).abs() < 0.01, "got {equator}");
    }

    #[test]
    fn reversing_a_segment_keeps_its_distance() {
        let forward = segment(&[(38.0, -121.0), (38.002, -121.001), (38.004, -120.999)]);
        let mut reversed = forward.clone();
        reversed.points.reverse();
        let a = segment_distance_meters(&forward);
        let b = segment_distance_meters(&reversed);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn no_leg_between_segments() {
        let p = [(0.0, 0.0), (0.0, 0.001), (0.0, 1.0), (0.0, 1.001)];
        let split = vec![Track::new(vec![
            segment(&p[..2]),
            segment(&p[2..]),
        ])];
        let joined = vec![Track::new(vec![segment(&p)])];
        let split_total = total_distance_meters(&split);
        let expected = segment_distance_meters(&segment(&p[..2]))
            + segment_distance_meters(&segment(&p[2..]));
        assert!((split_total - expected).abs() < 1e-9);
        assert!(total_distance_meters(&joined) > split_total + 100_000.0);
    }

    #[test]
    fn moving_a_point_across_a_boundary_changes_distance() {
        let before = vec![Track::new(vec![
            segment(&[(0.0, 0.0), (0.0, 0.01), (0.0, 0.02)]),
            segment(&[(1.0, 0.0), (1.0, 0.01)]),
        ])];
        let after = vec![Track::new(vec![
            segment(&[(0.0, 0.0), (0.0, 0.01)]),
            segment(&[(0.0, 0.02), (1.0, 0.0), (1.0, 0.01)]),
        ])];
        let delta = (total_distance_meters(&before) - total_distance_meters(&after)).abs();
        assert!(delta > 1000.0);
    }

    #[test]
    fn duration_rounds_and_clamps() {
        assert_eq!(
            duration_seconds("2024-05-01T07:00:00Z", "2024-05-01T07:10:00.600Z"),
            Some(601)
        );
        assert_eq!(
            duration_seconds("2024-05-01T08:00:00Z", "2024-05-01T07:00:00Z"),
            Some(0)
        );
        assert_eq!(duration_seconds("garbage", "2024-05-01T07:00:00Z"), None);
    }

    #[test]
    fn infer_without_timestamps_has_only_distance() {
        let parsed = ParsedTrack {
            tracks: vec![Track::new(vec![segment(&[(38.0, -121.0), (38.001, -121.0)])])],
            first_timestamp: None,
            last_timestamp: None,
            total_distance_meters: 111.19,
        };
        let metrics = RunMetrics::from_parsed(&parsed);
        assert_eq!(metrics.start_time, None);
        assert_eq!(metrics.duration_s, None);
        assert!((metrics.distance_km.expect("distance") - 0.11119).abs() < 1e-9);
    }

    #[test]
    fn infer_normalizes_start_time() {
        let parsed = ParsedTrack {
            first_timestamp: Some("2024-05-01T09:00:00+02:00".to_string()),
            last_timestamp: Some("2024-05-01T09:30:00+02:00".to_string()),
            ..ParsedTrack::default()
        };
        let metrics = RunMetrics::from_parsed(&parsed);
        assert_eq!(metrics.start_time.as_deref(), Some("2024-05-01T07:00:00.000Z"));
        assert_eq!(metrics.duration_s, Some(1800));
    }

    #[test]
    fn overrides_apply_per_field() {
        let inferred = RunMetrics {
            start_time: Some("2024-05-01T07:00:00.000Z".to_string()),
            duration_s: Some(1800),
            distance_km: Some(5.0),
        };

        let distance_only = RunOverrides {
            distance_km: Some(7.5),
            ..RunOverrides::default()
        };
        let resolved = distance_only.resolve(&inferred);
        assert_eq!(resolved.start_time, inferred.start_time);
        assert_eq!(resolved.duration_s, Some(1800));
        assert_eq!(resolved.distance_km, Some(7.5));

        let start_only = RunOverrides {
            start_time: Some(Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap()),
            ..RunOverrides::default()
        };
        let resolved = start_only.resolve(&inferred);
        assert_eq!(resolved.start_time.as_deref(), Some("2023-01-02T03:04:05.000Z"));
        assert_eq!(resolved.duration_s, Some(1800));
        assert_eq!(resolved.distance_km, Some(5.0));

        let resolved = RunOverrides::default().resolve(&RunMetrics::default());
        assert_eq!(resolved, RunMetrics::default());
    }
}

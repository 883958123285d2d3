use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use runmap_core::{Track, TrackPoint, TrackSegment};

use crate::types::{IngestError, Result};

const ROOT_ELEMENT: &[u8] = b"gpx";

// Element depths below the root: gpx > trk > trkseg > trkpt > lat|lon|time.
const TRACK_DEPTH: usize = 2;
const SEGMENT_DEPTH: usize = 3;
const POINT_DEPTH: usize = 4;
const FIELD_DEPTH: usize = 5;

/// Text of one point child element. Only the first occurrence counts.
#[derive(Debug, Default, Clone, PartialEq)]
enum FieldText {
    #[default]
    Absent,
    Text(String),
    Unreadable,
}

impl FieldText {
    fn scalar(&self) -> Option<&str> {
        match self {
            FieldText::Text(text) => Some(text.trim()).filter(|value| !value.is_empty()),
            _ => None,
        }
    }
}

// Coordinates may arrive either as child elements (`<lat>`) or as attributes
// (`lat="…"`); both are kept so the extraction rule below can choose.
#[derive(Debug, Default)]
struct RawPoint {
    lat: FieldText,
    lon: FieldText,
    time: FieldText,
    lat_attr: Option<String>,
    lon_attr: Option<String>,
}

impl RawPoint {
    fn from_start(start: &BytesStart<'_>) -> Self {
        let mut point = RawPoint::default();
        for attr in start.attributes().flatten() {
            let Ok(value) = attr.unescape_value() else {
                continue;
            };
            match attr.key.local_name().as_ref() {
                b"lat" => point.lat_attr = Some(value.into_owned()),
                b"lon" => point.lon_attr = Some(value.into_owned()),
                _ => {}
            }
        }
        point
    }

    fn record(&mut self, name: &[u8], value: FieldText) {
        let slot = match name {
            b"lat" => &mut self.lat,
            b"lon" => &mut self.lon,
            b"time" => &mut self.time,
            _ => return,
        };
        if *slot == FieldText::Absent {
            *slot = value;
        }
    }

    fn latitude(&self) -> Option<f64> {
        extract_coordinate(&self.lat, self.lat_attr.as_deref())
            .filter(|value| (-90.0..=90.0).contains(value))
    }

    fn longitude(&self) -> Option<f64> {
        extract_coordinate(&self.lon, self.lon_attr.as_deref())
            .filter(|value| (-180.0..=180.0).contains(value))
    }

    fn timestamp(&self) -> Option<&str> {
        self.time.scalar()
    }

    fn to_track_point(&self) -> Option<TrackPoint> {
        Some(TrackPoint {
            latitude: self.latitude()?,
            longitude: self.longitude()?,
            timestamp: self.timestamp().map(str::to_string),
        })
    }
}

/// Named field first, attribute second; anything unparsable or non-finite is invalid.
fn extract_coordinate(named: &FieldText, attribute: Option<&str>) -> Option<f64> {
    let raw = match named {
        FieldText::Unreadable => return None,
        FieldText::Text(text) if !text.trim().is_empty() => text.as_str(),
        _ => attribute.filter(|value| !value.trim().is_empty())?,
    };
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

#[derive(Debug)]
struct FieldCapture {
    depth: usize,
    text: String,
    unreadable: bool,
}

impl FieldCapture {
    fn into_text(self) -> FieldText {
        if self.unreadable {
            FieldText::Unreadable
        } else {
            FieldText::Text(self.text)
        }
    }
}

/// Tracks that survived filtering plus the time span seen while reading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackDocument {
    pub tracks: Vec<Track>,
    pub first_timestamp: Option<String>,
    pub last_timestamp: Option<String>,
}

/// Builds tracks from reader events. Structural errors are left to the reader;
/// anything odd inside a point only affects that point.
#[derive(Debug, Default)]
struct DocumentWalker {
    seen_root: bool,
    stack: Vec<Vec<u8>>,
    tracks: Vec<Track>,
    track: Option<Vec<TrackSegment>>,
    segment: Option<Vec<TrackPoint>>,
    point: Option<RawPoint>,
    field: Option<FieldCapture>,
    first_timestamp: Option<String>,
    last_timestamp: Option<String>,
}

impl DocumentWalker {
    fn check_root(&mut self, start: &BytesStart<'_>) -> Result<()> {
        if self.seen_root {
            return Ok(());
        }
        let name = start.local_name();
        if !name.as_ref().eq_ignore_ascii_case(ROOT_ELEMENT) {
            return Err(IngestError::Parse(format!(
                "expected <gpx> root element, found <{}>",
                String::from_utf8_lossy(name.as_ref())
            )));
        }
        self.seen_root = true;
        Ok(())
    }

    fn finished(&self) -> bool {
        self.seen_root && self.stack.is_empty()
    }

    fn open(&mut self, start: &BytesStart<'_>) {
        let name = start.local_name().as_ref().to_vec();
        let depth = self.stack.len() + 1;
        if let Some(field) = self.field.as_mut() {
            field.unreadable = true;
        } else {
            match (depth, name.as_slice()) {
                (TRACK_DEPTH, b"trk") => self.track = Some(Vec::new()),
                (SEGMENT_DEPTH, b"trkseg") if self.track.is_some() => {
                    self.segment = Some(Vec::new())
                }
                (POINT_DEPTH, b"trkpt") if self.segment.is_some() => {
                    self.point = Some(RawPoint::from_start(start))
                }
                (FIELD_DEPTH, b"lat" | b"lon" | b"time") if self.point.is_some() => {
                    self.field = Some(FieldCapture {
                        depth,
                        text: String::new(),
                        unreadable: false,
                    })
                }
                _ => {}
            }
        }
        self.stack.push(name);
    }

    fn push_text(&mut self, chunk: Option<Cow<'_, str>>) {
        let depth = self.stack.len();
        let Some(field) = self.field.as_mut().filter(|field| field.depth == depth) else {
            return;
        };
        match chunk {
            Some(chunk) => field.text.push_str(&chunk),
            None => field.unreadable = true,
        }
    }

    fn close(&mut self) {
        let depth = self.stack.len();
        let Some(name) = self.stack.pop() else {
            return;
        };
        if let Some(field) = self.field.take() {
            if field.depth != depth {
                self.field = Some(field);
            } else if let Some(point) = self.point.as_mut() {
                point.record(&name, field.into_text());
            }
            return;
        }
        match (depth, name.as_slice()) {
            (POINT_DEPTH, b"trkpt") => {
                if let Some(point) = self.point.take() {
                    self.finish_point(&point);
                }
            }
            (SEGMENT_DEPTH, b"trkseg") => {
                if let Some(points) = self.segment.take() {
                    let segment = TrackSegment::new(points);
                    if !segment.is_degenerate()
                        && let Some(track) = self.track.as_mut()
                    {
                        track.push(segment);
                    }
                }
            }
            (TRACK_DEPTH, b"trk") => {
                if let Some(segments) = self.track.take()
                    && !segments.is_empty()
                {
                    self.tracks.push(Track::new(segments));
                }
            }
            _ => {}
        }
    }

    fn finish_point(&mut self, point: &RawPoint) {
        if let Some(ts) = point.timestamp() {
            if self.first_timestamp.is_none() {
                self.first_timestamp = Some(ts.to_string());
            }
            self.last_timestamp = Some(ts.to_string());
        }
        if let (Some(point), Some(segment)) = (point.to_track_point(), self.segment.as_mut()) {
            segment.push(point);
        }
    }

    fn into_document(self) -> Result<TrackDocument> {
        if !self.seen_root {
            return Err(IngestError::Parse("document has no root element".to_string()));
        }
        if let Some(open) = self.stack.last() {
            return Err(IngestError::Parse(format!(
                "document ended inside <{}>",
                String::from_utf8_lossy(open)
            )));
        }
        if self.tracks.is_empty() {
            return Err(IngestError::GeometryEmpty);
        }
        Ok(TrackDocument {
            tracks: self.tracks,
            first_timestamp: self.first_timestamp,
            last_timestamp: self.last_timestamp,
        })
    }
}

/// Parses track-file text into tracks of qualifying segments.
///
/// Points missing either coordinate are skipped, segments with fewer than two
/// remaining points are dropped, and tracks left without segments are dropped.
/// Timestamps are collected from every point in document order, valid or not.
pub fn parse_track_document(text: &str) -> Result<TrackDocument> {
    let text = text.trim_start_matches('\u{feff}');
    let mut reader = Reader::from_str(text);
    let mut walker = DocumentWalker::default();
    loop {
        let event = reader
            .read_event()
            .map_err(|err| IngestError::Parse(err.to_string()))?;
        match event {
            Event::Start(start) => {
                walker.check_root(&start)?;
                walker.open(&start);
            }
            Event::Empty(start) => {
                walker.check_root(&start)?;
                walker.open(&start);
                walker.close();
            }
            Event::End(_) => walker.close(),
            Event::Text(text) => walker.push_text(text.unescape().ok()),
            Event::CData(data) => {
                walker.push_text(std::str::from_utf8(&data).ok().map(Cow::Borrowed))
            }
            Event::Eof => break,
            _ => {}
        }
        if walker.finished() {
            break;
        }
    }
    walker.into_document()
}

/// Parses the timestamp shapes seen in track files and request fields.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(parsed, Utc));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let parsed = date.and_hms_opt(0, 0, 0)?;
        return Some(DateTime::<Utc>::from_naive_utc_and_offset(parsed, Utc));
    }
    if !raw.is_empty()
        && raw.chars().all(|ch| ch.is_ascii_digit())
        && let Ok(value) = raw.parse::<i64>()
    {
        let (secs, nanos) = if raw.len() > 10 {
            (
                value / 1000,
                (value % 1000).unsigned_abs() as u32 * 1_000_000,
            )
        } else {
            (value, 0)
        };
        return DateTime::<Utc>::from_timestamp(secs, nanos);
    }
    None
}

pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn normalize_timestamp(raw: &str) -> Option<String> {
    parse_timestamp(raw).map(format_timestamp)
}

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use ingest::{
    ContentStore, FsContentStore, IngestErrorKind, IngestPipeline, MetadataStore,
    PipelineConfig, ReferenceRequest, RunOverrides, StoreError, UploadRequest, content_hash,
};
use runmap_core::NewRun;
use runmap_db::Db;
use tempfile::tempdir;

const SHORT_TRACK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <trk><trkseg>
    <trkpt lat="38.000000" lon="-121.000000"/>
    <trkpt lat="38.001000" lon="-121.000000"/>
  </trkseg></trk>
</gpx>"#;

const TIMED_TRACK: &str = r#"<gpx>
  <trk>
    <trkseg>
      <trkpt lat="0" lon="0"><time>2024-05-01T07:00:00Z</time></trkpt>
      <trkpt lat="0" lon="0.001"><time>2024-05-01T07:05:00Z</time></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="1" lon="0"><time>2024-05-01T07:20:00Z</time></trkpt>
      <trkpt lat="1" lon="0.001"><time>2024-05-01T07:30:00.400Z</time></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

#[derive(Default)]
struct MemoryContent {
    objects: RefCell<HashMap<String, Vec<u8>>>,
    fail_writes: bool,
}

impl MemoryContent {
    fn with_object(key: &str, bytes: &[u8]) -> Self {
        let store = Self::default();
        store
            .objects
            .borrow_mut()
            .insert(key.to_string(), bytes.to_vec());
        store
    }
}

impl ContentStore for MemoryContent {
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.objects
            .borrow()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.objects
            .borrow_mut()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingMetadata {
    rows: Vec<NewRun>,
    reject: bool,
}

impl MetadataStore for RecordingMetadata {
    fn insert_run(&mut self, run: &NewRun) -> Result<i64, StoreError> {
        if self.reject {
            return Err(StoreError::InvalidKey("constraint failed".to_string()));
        }
        self.rows.push(run.clone());
        Ok(self.rows.len() as i64)
    }
}

fn pipeline(
    content: MemoryContent,
    metadata: RecordingMetadata,
) -> IngestPipeline<MemoryContent, RecordingMetadata> {
    IngestPipeline::new(PipelineConfig::default(), content, metadata)
}

#[test]
fn reference_flow_records_geometry_and_distance() {
    let mut pipeline = pipeline(
        MemoryContent::with_object("runs/short.gpx", SHORT_TRACK.as_bytes()),
        RecordingMetadata::default(),
    );
    let result = pipeline
        .ingest_by_reference(ReferenceRequest {
            path: "runs/short.gpx".to_string(),
            overrides: RunOverrides::default(),
        })
        .expect("ingest");

    assert_eq!(result.id, 1);
    assert_eq!(result.content_hash, content_hash(SHORT_TRACK.as_bytes()));
    assert_eq!(result.storage_path, None);

    let (_, metadata) = pipeline.into_parts();
    let row = &metadata.rows[0];
    assert_eq!(row.wkt, "MULTILINESTRING((-121 38, -121 38.001))");
    assert_eq!(row.start_time, None);
    assert_eq!(row.duration_s, None);
    assert_eq!(row.source_file, "runs/short.gpx");
    let meters = row.distance_km.expect("distance") * 1000.0;
    assert!((meters - 111.2).abs() < 0.05, "got {meters}");
}

#[test]
fn disjoint_segments_stay_separate() {
    let mut pipeline = pipeline(
        MemoryContent::with_object("timed.gpx", TIMED_TRACK.as_bytes()),
        RecordingMetadata::default(),
    );
    pipeline
        .ingest_by_reference(ReferenceRequest {
            path: "timed.gpx".to_string(),
            overrides: RunOverrides::default(),
        })
        .expect("ingest");

    let row = &pipeline.metadata().rows[0];
    assert_eq!(row.wkt, "MULTILINESTRING((0 0, 0.001 0), (0 1, 0.001 1))");
    assert_eq!(row.start_time.as_deref(), Some("2024-05-01T07:00:00.000Z"));
    assert_eq!(row.duration_s, Some(1800));
    let km = row.distance_km.expect("distance");
    // two ~111 m legs; a leg between segments would add ~111 km
    assert!(km > 0.22 && km < 0.225, "got {km}");
}

#[test]
fn distance_override_keeps_inferred_start() {
    let mut pipeline = pipeline(
        MemoryContent::with_object("timed.gpx", TIMED_TRACK.as_bytes()),
        RecordingMetadata::default(),
    );
    pipeline
        .ingest_by_reference(ReferenceRequest {
            path: "timed.gpx".to_string(),
            overrides: RunOverrides {
                distance_km: Some(10.0),
                ..RunOverrides::default()
            },
        })
        .expect("ingest");

    let row = &pipeline.metadata().rows[0];
    assert_eq!(row.distance_km, Some(10.0));
    assert_eq!(row.start_time.as_deref(), Some("2024-05-01T07:00:00.000Z"));
    assert_eq!(row.duration_s, Some(1800));
}

#[test]
fn reference_flow_error_kinds() {
    let mut pipeline = pipeline(
        MemoryContent::with_object("bad.gpx", b"<kml><Document/></kml>"),
        RecordingMetadata::default(),
    );
    let blank = pipeline
        .ingest_by_reference(ReferenceRequest {
            path: "  ".to_string(),
            overrides: RunOverrides::default(),
        })
        .expect_err("blank path");
    assert_eq!(blank.kind(), IngestErrorKind::MissingInput);

    let missing = pipeline
        .ingest_by_reference(ReferenceRequest {
            path: "absent.gpx".to_string(),
            overrides: RunOverrides::default(),
        })
        .expect_err("absent");
    assert_eq!(missing.kind(), IngestErrorKind::StoreFetch);

    let parse = pipeline
        .ingest_by_reference(ReferenceRequest {
            path: "bad.gpx".to_string(),
            overrides: RunOverrides::default(),
        })
        .expect_err("wrong root");
    assert_eq!(parse.kind(), IngestErrorKind::Parse);
    assert!(pipeline.metadata().rows.is_empty());
}

#[test]
fn degenerate_upload_is_geometry_empty_and_not_stored() {
    let mut pipeline = pipeline(MemoryContent::default(), RecordingMetadata::default());
    let doc = r#"<gpx><trk><trkseg><trkpt lat="1" lon="1"/></trkseg></trk></gpx>"#;
    let err = pipeline
        .ingest_by_upload(UploadRequest {
            bytes: doc.as_bytes().to_vec(),
            filename: Some("lonely.gpx".to_string()),
            ..UploadRequest::default()
        })
        .expect_err("degenerate");
    assert_eq!(err.kind(), IngestErrorKind::GeometryEmpty);
    assert!(pipeline.content().objects.borrow().is_empty());
}

#[test]
fn upload_derives_key_from_start_time_and_hash() {
    let mut pipeline = pipeline(MemoryContent::default(), RecordingMetadata::default());
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 6, 30, 0).unwrap();
    let result = pipeline
        .ingest_by_upload(UploadRequest {
            bytes: SHORT_TRACK.as_bytes().to_vec(),
            filename: Some("Möt Run #1".to_string()),
            path: None,
            overrides: RunOverrides {
                start_time: Some(start),
                ..RunOverrides::default()
            },
        })
        .expect("upload");

    let hash = content_hash(SHORT_TRACK.as_bytes());
    let expected = format!("my-runs/2024-05-01_{}_Mot_Run_1.gpx", &hash[..12]);
    assert_eq!(result.storage_path.as_deref(), Some(expected.as_str()));
    assert_eq!(
        pipeline.content().get(&expected).expect("stored"),
        SHORT_TRACK.as_bytes()
    );
    let row = &pipeline.metadata().rows[0];
    assert_eq!(row.source_file, expected);
    assert_eq!(row.start_time.as_deref(), Some("2024-05-01T06:30:00.000Z"));
}

#[test]
fn upload_uses_explicit_path_verbatim() {
    let mut pipeline = pipeline(MemoryContent::default(), RecordingMetadata::default());
    let result = pipeline
        .ingest_by_upload(UploadRequest {
            bytes: SHORT_TRACK.as_bytes().to_vec(),
            filename: Some("ignored.gpx".to_string()),
            path: Some("races/Boston 2024.gpx".to_string()),
            overrides: RunOverrides::default(),
        })
        .expect("upload");
    assert_eq!(result.storage_path.as_deref(), Some("races/Boston 2024.gpx"));
}

#[test]
fn empty_upload_is_parse_error_and_not_stored() {
    let mut pipeline = pipeline(MemoryContent::default(), RecordingMetadata::default());
    let err = pipeline
        .ingest_by_upload(UploadRequest::default())
        .expect_err("empty");
    assert_eq!(err.kind(), IngestErrorKind::Parse);
    assert!(pipeline.content().objects.borrow().is_empty());
    assert!(pipeline.metadata().rows.is_empty());
}

#[test]
fn failed_write_skips_insert() {
    let content = MemoryContent {
        fail_writes: true,
        ..MemoryContent::default()
    };
    let mut pipeline = pipeline(content, RecordingMetadata::default());
    let err = pipeline
        .ingest_by_upload(UploadRequest {
            bytes: SHORT_TRACK.as_bytes().to_vec(),
            ..UploadRequest::default()
        })
        .expect_err("write fails");
    assert_eq!(err.kind(), IngestErrorKind::StoreWrite);
    assert!(pipeline.metadata().rows.is_empty());
}

#[test]
fn rejected_insert_leaves_uploaded_bytes() {
    let metadata = RecordingMetadata {
        reject: true,
        ..RecordingMetadata::default()
    };
    let mut pipeline = pipeline(MemoryContent::default(), metadata);
    let err = pipeline
        .ingest_by_upload(UploadRequest {
            bytes: SHORT_TRACK.as_bytes().to_vec(),
            path: Some("kept.gpx".to_string()),
            ..UploadRequest::default()
        })
        .expect_err("insert rejected");
    assert_eq!(err.kind(), IngestErrorKind::Rpc);
    assert!(pipeline.content().get("kept.gpx").is_ok());
}

#[test]
fn invalid_utf8_is_decoded_lossily() {
    let mut bytes = SHORT_TRACK.replace("creator=\"test\"", "creator=\"XX\"").into_bytes();
    let pos = bytes
        .windows(2)
        .position(|pair| pair == b"XX")
        .expect("marker");
    bytes[pos] = 0xff;
    let mut pipeline = pipeline(MemoryContent::default(), RecordingMetadata::default());
    let result = pipeline
        .ingest_by_upload(UploadRequest {
            bytes: bytes.clone(),
            path: Some("lossy.gpx".to_string()),
            ..UploadRequest::default()
        })
        .expect("upload");
    assert_eq!(result.content_hash, content_hash(&bytes));
}

#[test]
fn filesystem_and_sqlite_reject_duplicate_content() {
    let dir = tempdir().expect("temp dir");
    let mut db = Db::open(dir.path().join("runs.sqlite")).expect("open db");
    db.migrate().expect("migrate");
    let content = FsContentStore::new(dir.path().join("content"));
    let mut pipeline = IngestPipeline::new(
        PipelineConfig {
            upload_prefix: "uploads".to_string(),
        },
        content,
        db,
    );

    let first = pipeline
        .ingest_by_upload(UploadRequest {
            bytes: TIMED_TRACK.as_bytes().to_vec(),
            filename: Some("morning.gpx".to_string()),
            ..UploadRequest::default()
        })
        .expect("first upload");
    let key = first.storage_path.clone().expect("key");
    assert!(key.starts_with("uploads/"));
    assert!(dir.path().join("content").join(&key).is_file());

    let again = pipeline
        .ingest_by_reference(ReferenceRequest {
            path: key.clone(),
            overrides: RunOverrides::default(),
        })
        .expect_err("duplicate hash");
    assert_eq!(again.kind(), IngestErrorKind::Rpc);

    let (_, db) = pipeline.into_parts();
    let stored = db
        .get_run_by_hash(&first.content_hash)
        .expect("lookup")
        .expect("row");
    assert_eq!(stored.id, first.id);
    assert_eq!(stored.source_file, key);
    assert_eq!(db.count_runs().expect("count"), 1);
}

use std::time::Instant;

use chrono::Utc;
use runmap_core::{NewRun, ParsedTrack};
use tracing::{debug, info, warn};

use crate::geometry::build_multilinestring;
use crate::identity::content_hash;
use crate::parser::parse_track_document;
use crate::paths::{derive_storage_key, short_hash};
use crate::store::{ContentStore, MetadataStore, StoreError};
use crate::totals::{RunMetrics, total_distance_meters};
use crate::types::{
    IngestError, IngestResult, PipelineConfig, ReferenceRequest, Result, RunOverrides,
    UploadRequest,
};

/// Parses track text and computes its total distance.
pub fn parse_track(text: &str) -> Result<ParsedTrack> {
    let document = parse_track_document(text)?;
    let total_distance_meters = total_distance_meters(&document.tracks);
    Ok(ParsedTrack {
        tracks: document.tracks,
        first_timestamp: document.first_timestamp,
        last_timestamp: document.last_timestamp,
        total_distance_meters,
    })
}

/// Everything derived from the raw bytes before any store is touched.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRun {
    pub content_hash: String,
    pub parsed: ParsedTrack,
    pub geometry: String,
}

impl PreparedRun {
    pub fn inferred_metrics(&self) -> RunMetrics {
        RunMetrics::from_parsed(&self.parsed)
    }

    fn into_new_run(self, overrides: &RunOverrides, source_file: String) -> NewRun {
        let metrics = overrides.resolve(&self.inferred_metrics());
        NewRun {
            wkt: self.geometry,
            start_time: metrics.start_time,
            duration_s: metrics.duration_s,
            distance_km: metrics.distance_km,
            source_file,
            content_hash: self.content_hash,
        }
    }
}

/// Hashes, parses and encodes one track file.
///
/// Bytes that are not valid UTF-8 are decoded lossily; the hash always covers
/// the original bytes.
pub fn prepare_run(bytes: &[u8]) -> Result<PreparedRun> {
    let content_hash = content_hash(bytes);
    let text = String::from_utf8_lossy(bytes);
    let parsed = parse_track(&text)?;
    let geometry = build_multilinestring(&parsed.tracks)?;
    Ok(PreparedRun {
        content_hash,
        parsed,
        geometry,
    })
}

/// Runs both ingestion flows against a content store and a metadata store.
///
/// Each call is linear: the first failing step ends it. An upload whose bytes
/// were written but whose row was rejected leaves the object in place.
pub struct IngestPipeline<C, M> {
    config: PipelineConfig,
    content: C,
    metadata: M,
}

impl<C: ContentStore, M: MetadataStore> IngestPipeline<C, M> {
    pub fn new(config: PipelineConfig, content: C, metadata: M) -> Self {
        Self {
            config,
            content,
            metadata,
        }
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    pub fn into_parts(self) -> (C, M) {
        (self.content, self.metadata)
    }

    /// Ingests a track already present in the content store at `path`.
    pub fn ingest_by_reference(&mut self, request: ReferenceRequest) -> Result<IngestResult> {
        let ReferenceRequest { path, overrides } = request;
        if path.trim().is_empty() {
            return Err(IngestError::MissingInput("path".to_string()));
        }

        let step = Instant::now();
        let bytes = self.content.get(&path).map_err(|err| {
            if matches!(err, StoreError::NotFound(_)) {
                warn!(path = %path, "referenced track is missing");
            }
            IngestError::StoreFetch(err.to_string())
        })?;
        let fetch_ms = step.elapsed().as_millis() as u64;

        let step = Instant::now();
        let prepared = prepare_run(&bytes)?;
        debug!(
            segments = prepared.parsed.segment_count(),
            points = prepared.parsed.point_count(),
            fetch_ms,
            parse_ms = step.elapsed().as_millis() as u64,
            "prepared referenced track"
        );

        let content_hash = prepared.content_hash.clone();
        let run = prepared.into_new_run(&overrides, path.clone());
        let step = Instant::now();
        let id = self
            .metadata
            .insert_run(&run)
            .map_err(|err| IngestError::Rpc(err.to_string()))?;
        debug!(insert_ms = step.elapsed().as_millis() as u64, "inserted run");

        info!(
            flow = "reference",
            id,
            hash = short_hash(&content_hash),
            path = %path,
            "ingested run"
        );
        Ok(IngestResult {
            id,
            content_hash,
            storage_path: None,
        })
    }

    /// Stores caller-supplied bytes and records the run.
    pub fn ingest_by_upload(&mut self, request: UploadRequest) -> Result<IngestResult> {
        let UploadRequest {
            bytes,
            filename,
            path,
            overrides,
        } = request;

        let step = Instant::now();
        let prepared = prepare_run(&bytes)?;
        debug!(
            segments = prepared.parsed.segment_count(),
            points = prepared.parsed.point_count(),
            parse_ms = step.elapsed().as_millis() as u64,
            "prepared upload"
        );

        let date = overrides
            .start_time
            .unwrap_or_else(Utc::now)
            .date_naive();
        let key = derive_storage_key(
            path.as_deref(),
            filename.as_deref(),
            &prepared.content_hash,
            date,
            &self.config.upload_prefix,
        );
        let step = Instant::now();
        self.content
            .put(&key, &bytes)
            .map_err(|err| IngestError::StoreWrite(err.to_string()))?;
        debug!(
            key = %key,
            bytes = bytes.len(),
            store_ms = step.elapsed().as_millis() as u64,
            "stored upload"
        );

        let content_hash = prepared.content_hash.clone();
        let run = prepared.into_new_run(&overrides, key.clone());
        let step = Instant::now();
        let id = match self.metadata.insert_run(&run) {
            Ok(id) => id,
            Err(err) => {
                warn!(
                    key = %key,
                    content_hash = %content_hash,
                    error = %err,
                    "stored upload has no run row"
                );
                return Err(IngestError::Rpc(err.to_string()));
            }
        };

        debug!(insert_ms = step.elapsed().as_millis() as u64, "inserted run");

        info!(
            flow = "upload",
            id,
            hash = short_hash(&content_hash),
            key = %key,
            "ingested run"
        );
        Ok(IngestResult {
            id,
            content_hash,
            storage_path: Some(key),
        })
    }
}

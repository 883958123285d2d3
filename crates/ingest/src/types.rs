use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::paths::DEFAULT_UPLOAD_PREFIX;

/// Construction-time settings for [`crate::IngestPipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Namespace that derived upload keys are placed under.
    pub upload_prefix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            upload_prefix: DEFAULT_UPLOAD_PREFIX.to_string(),
        }
    }
}

/// Caller-supplied values that replace inferred ones, each field on its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOverrides {
    pub start_time: Option<DateTime<Utc>>,
    pub duration_s: Option<i64>,
    pub distance_km: Option<f64>,
}

/// Ingest a track that already lives in the content store.
#[derive(Debug, Clone, Default)]
pub struct ReferenceRequest {
    pub path: String,
    pub overrides: RunOverrides,
}

/// Ingest raw bytes handed over by the caller.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
    /// Explicit storage key; when blank a key is derived from filename, hash and date.
    pub path: Option<String>,
    pub overrides: RunOverrides,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestResult {
    pub id: i64,
    pub content_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
}

/// Non-fatal issues encountered while scanning a directory.
#[derive(Debug, Clone, Serialize)]
pub struct IngestIssue {
    pub file_path: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub files: Vec<PathBuf>,
    pub issues: Vec<IngestIssue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestErrorKind {
    MissingInput,
    Parse,
    GeometryEmpty,
    StoreFetch,
    StoreWrite,
    Rpc,
}

impl IngestErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingInput => "missing_input",
            Self::Parse => "parse_error",
            Self::GeometryEmpty => "geometry_empty",
            Self::StoreFetch => "store_fetch",
            Self::StoreWrite => "store_write",
            Self::Rpc => "rpc_error",
        }
    }
}

/// Errors emitted by the ingest pipeline. Every variant is terminal.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("no track segment with at least two valid points")]
    GeometryEmpty,
    #[error("fetch failed: {0}")]
    StoreFetch(String),
    #[error("write failed: {0}")]
    StoreWrite(String),
    #[error("insert failed: {0}")]
    Rpc(String),
}

impl IngestError {
    pub fn kind(&self) -> IngestErrorKind {
        match self {
            Self::MissingInput(_) => IngestErrorKind::MissingInput,
            Self::Parse(_) => IngestErrorKind::Parse,
            Self::GeometryEmpty => IngestErrorKind::GeometryEmpty,
            Self::StoreFetch(_) => IngestErrorKind::StoreFetch,
            Self::StoreWrite(_) => IngestErrorKind::StoreWrite,
            Self::Rpc(_) => IngestErrorKind::Rpc,
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;

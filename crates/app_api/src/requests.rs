use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize, Default)]
pub struct EmptyRequest {}

/// Body of `gpx_ingest`. Fields stay untyped so a value of the wrong shape can
/// be reported as missing input instead of a decode failure.
#[derive(Debug, Deserialize, Default)]
pub struct IngestByReferenceRequest {
    #[serde(default)]
    pub path: Option<Value>,
    #[serde(default)]
    pub start_time: Option<Value>,
    #[serde(default)]
    pub duration_s: Option<Value>,
    #[serde(default)]
    pub distance_km: Option<Value>,
}

/// Fields of a `gpx_ingest_upload` form. Numbers and dates arrive as text.
#[derive(Debug, Default)]
pub struct IngestByUploadRequest {
    pub file: Option<Vec<u8>>,
    /// File name carried by the `file` part itself.
    pub part_filename: Option<String>,
    pub filename: Option<String>,
    pub path: Option<String>,
    pub start_time: Option<String>,
    pub duration_s: Option<String>,
    pub distance_km: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RunsListRequest {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RunGetRequest {
    pub id: i64,
}

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct IngestByReferenceResponse {
    pub id: i64,
    pub content_hash: String,
}

#[derive(Debug, Serialize)]
pub struct IngestByUploadResponse {
    pub id: i64,
    pub path: String,
    pub content_hash: String,
}

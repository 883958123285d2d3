use ingest::IngestErrorKind;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("db error: {0}")]
    Db(#[from] runmap_db::DbError),
    #[error(transparent)]
    Ingest(#[from] ingest::IngestError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

fn ingest_status(kind: IngestErrorKind) -> u16 {
    match kind {
        IngestErrorKind::MissingInput => 400,
        IngestErrorKind::Parse | IngestErrorKind::GeometryEmpty => 422,
        IngestErrorKind::StoreFetch => 404,
        IngestErrorKind::StoreWrite | IngestErrorKind::Rpc => 500,
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let (status, code) = match &err {
            AppError::Ingest(inner) => {
                let kind = inner.kind();
                (ingest_status(kind), Some(kind.as_str().to_string()))
            }
            AppError::NotFound(_) => (404, Some("not_found".to_string())),
            AppError::Db(_) | AppError::Io(_) | AppError::Message(_) => (500, None),
        };
        Self {
            status,
            message: err.to_string(),
            code,
        }
    }
}

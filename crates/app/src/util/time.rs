use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use ingest::IngestError;

/// Parses a caller-supplied start time. Malformed values are missing input.
pub fn parse_start_time(value: &str) -> Result<DateTime<Utc>> {
    ingest::parse_timestamp(value).ok_or_else(|| {
        AppError::Ingest(IngestError::MissingInput(format!(
            "invalid start_time: {}",
            value
        )))
    })
}

/// Blank values count as absent.
pub fn parse_optional_start_time(value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => parse_start_time(value).map(Some),
        None => Ok(None),
    }
}

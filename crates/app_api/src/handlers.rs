use ingest::{IngestError, ReferenceRequest, RunOverrides, UploadRequest};
use runmap_app::{AppError, ListParams, Result, RunsPage, parse_optional_start_time};
use runmap_core::{RunRecord, RunStats};
use serde_json::Value;
use tracing::debug;

use crate::{
    AppContext, IngestByReferenceRequest, IngestByReferenceResponse, IngestByUploadRequest,
    IngestByUploadResponse, RunGetRequest, RunsListRequest,
};

fn missing_input(message: impl Into<String>) -> AppError {
    AppError::Ingest(IngestError::MissingInput(message.into()))
}

/// Trimmed text, with blank values treated as absent.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Longest explicit duration accepted, in seconds.
const MAX_DURATION_S: i64 = i32::MAX as i64;

fn parse_number<T: std::str::FromStr>(field: &str, value: Option<String>) -> Result<Option<T>> {
    match present(value) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| missing_input(format!("invalid {}: {}", field, raw))),
        None => Ok(None),
    }
}

/// Text of a JSON scalar. Numbers keep their JSON spelling; null is absent.
fn json_text(field: &str, value: Option<Value>, allow_number: bool) -> Result<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(present(Some(text))),
        Some(Value::Number(number)) if allow_number => Ok(Some(number.to_string())),
        Some(_) => Err(missing_input(format!("invalid {}", field))),
    }
}

/// Whole seconds, allowing integral fractions such as `600.0`.
fn parse_duration(value: Option<String>) -> Result<Option<i64>> {
    let Some(raw) = present(value) else {
        return Ok(None);
    };
    let seconds = match raw.parse::<i64>() {
        Ok(seconds) => Some(seconds),
        Err(_) => raw
            .parse::<f64>()
            .ok()
            .filter(|value| value.fract() == 0.0 && value.abs() <= MAX_DURATION_S as f64)
            .map(|value| value as i64),
    };
    match seconds {
        Some(seconds) if (0..=MAX_DURATION_S).contains(&seconds) => Ok(Some(seconds)),
        _ => Err(missing_input(format!("invalid duration_s: {}", raw))),
    }
}

fn require_path(path: Option<Value>) -> Result<String> {
    match path {
        Some(Value::String(path)) if !path.trim().is_empty() => Ok(path),
        Some(Value::String(_)) | None | Some(Value::Null) => Err(missing_input("path is required")),
        Some(_) => Err(missing_input("path must be a string")),
    }
}

fn require_finite(distance_km: Option<f64>) -> Result<Option<f64>> {
    match distance_km {
        Some(value) if !value.is_finite() => Err(missing_input("invalid distance_km")),
        other => Ok(other),
    }
}

pub fn ingest_by_reference(
    ctx: &AppContext,
    req: IngestByReferenceRequest,
) -> Result<IngestByReferenceResponse> {
    let path = require_path(req.path)?;
    let start_time = json_text("start_time", req.start_time, false)?;
    let overrides = RunOverrides {
        start_time: parse_optional_start_time(start_time.as_deref())?,
        duration_s: parse_duration(json_text("duration_s", req.duration_s, true)?)?,
        distance_km: require_finite(parse_number(
            "distance_km",
            json_text("distance_km", req.distance_km, true)?,
        )?)?,
    };
    debug!(path = %path, ?overrides, "ingest by reference");
    let result = ctx
        .app_state
        .services
        .ingest
        .by_reference(ReferenceRequest { path, overrides })?;
    Ok(IngestByReferenceResponse {
        id: result.id,
        content_hash: result.content_hash,
    })
}

pub fn ingest_by_upload(
    ctx: &AppContext,
    req: IngestByUploadRequest,
) -> Result<IngestByUploadResponse> {
    let bytes = req
        .file
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| missing_input("file is required"))?;
    let overrides = RunOverrides {
        start_time: parse_optional_start_time(req.start_time.as_deref())?,
        duration_s: parse_duration(req.duration_s)?,
        distance_km: require_finite(parse_number("distance_km", req.distance_km)?)?,
    };
    let filename = present(req.filename).or_else(|| present(req.part_filename));
    debug!(
        bytes = bytes.len(),
        filename = filename.as_deref().unwrap_or("-"),
        ?overrides,
        "ingest by upload"
    );
    let result = ctx.app_state.services.ingest.by_upload(UploadRequest {
        bytes,
        filename,
        path: present(req.path),
        overrides,
    })?;
    let path = result
        .storage_path
        .ok_or_else(|| AppError::Message("upload produced no storage path".to_string()))?;
    Ok(IngestByUploadResponse {
        id: result.id,
        path,
        content_hash: result.content_hash,
    })
}

pub fn runs_list(ctx: &AppContext, req: RunsListRequest) -> Result<RunsPage> {
    let params = ListParams {
        limit: req.limit,
        offset: req.offset,
    };
    ctx.app_state.services.runs.list(&params)
}

pub fn run_get(ctx: &AppContext, req: RunGetRequest) -> Result<RunRecord> {
    ctx.app_state.services.runs.get(req.id)
}

pub fn runs_stats(ctx: &AppContext) -> Result<RunStats> {
    ctx.app_state.services.runs.stats()
}

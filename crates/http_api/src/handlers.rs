use axum::{
    extract::{Json, Multipart, State, rejection::JsonRejection},
    response::IntoResponse,
};

use app_api::{
    EmptyRequest, IngestByReferenceRequest, IngestByUploadRequest, RunGetRequest,
    RunsListRequest,
};

use crate::{errors::HttpError, state::HttpState};

pub async fn gpx_ingest(
    State(state): State<HttpState>,
    body: Result<Json<IngestByReferenceRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let Json(req) = body?;
    let response = app_api::ingest_by_reference(&state.context, req)?;
    Ok(Json(response))
}

pub async fn gpx_ingest_upload(
    State(state): State<HttpState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let req = read_upload_form(multipart).await?;
    let response = app_api::ingest_by_upload(&state.context, req)?;
    Ok(Json(response))
}

pub async fn runs_list(
    State(state): State<HttpState>,
    body: Result<Json<RunsListRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let Json(req) = body?;
    let response = app_api::runs_list(&state.context, req)?;
    Ok(Json(response))
}

pub async fn run_get(
    State(state): State<HttpState>,
    body: Result<Json<RunGetRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let Json(req) = body?;
    let response = app_api::run_get(&state.context, req)?;
    Ok(Json(response))
}

pub async fn runs_stats(
    State(state): State<HttpState>,
    body: Result<Json<EmptyRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let Json(EmptyRequest {}) = body?;
    let response = app_api::runs_stats(&state.context)?;
    Ok(Json(response))
}

/// Collects the known form fields; unknown fields are drained and ignored.
async fn read_upload_form(mut multipart: Multipart) -> Result<IngestByUploadRequest, HttpError> {
    let mut req = IngestByUploadRequest::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                req.part_filename = field.file_name().map(str::to_string);
                req.file = Some(field.bytes().await?.to_vec());
            }
            "filename" => req.filename = Some(field.text().await?),
            "path" => req.path = Some(field.text().await?),
            "start_time" => req.start_time = Some(field.text().await?),
            "duration_s" => req.duration_s = Some(field.text().await?),
            "distance_km" => req.distance_km = Some(field.text().await?),
            _ => {
                field.bytes().await?;
            }
        }
    }
    Ok(req)
}

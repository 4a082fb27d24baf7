use std::str::FromStr;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use hoard_protocol::{
    BlobEntry, BlobsQuery, BlobsResponse, HealthResponse, ProtocolError, StatsResponse,
    UploadResponse, UploadedBlob,
};
use hoard_sdk::UploadPart;
use hoard_types::BlobId;
use tracing::debug;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Health check handler.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// `GET /blob/{id}`: raw blob bytes.
pub async fn get_blob(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Response> {
    let id = BlobId::from_str(&id).map_err(|_| ProtocolError::InvalidId(id))?;
    let data = state.hoard.get(&id).await?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], data).into_response())
}

/// `POST /upload`: every multipart part is one blob, named by its claimed id.
///
/// Parts are stored in order; the first failing part ends the request and
/// later parts are not read.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ServerResult<Json<UploadResponse>> {
    let mut blobs: Vec<UploadedBlob> = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let claimed = match field.name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                return Err(ProtocolError::Multipart(format!(
                    "part {} has no name; expected the blob id",
                    blobs.len()
                ))
                .into())
            }
        };
        let data = field.bytes().await?;
        let receipt = state.hoard.upload(UploadPart::claimed(claimed, data)).await?;
        blobs.push(receipt.into());
    }
    debug!(parts = blobs.len(), "upload complete");
    Ok(Json(UploadResponse { blobs }))
}

/// `GET /blobs?start=&end=&limit=`: one page of the time index.
pub async fn list_blobs(
    State(state): State<AppState>,
    query: Result<Query<BlobsQuery>, QueryRejection>,
) -> ServerResult<Json<BlobsResponse>> {
    let Query(query) = query?;
    let start = query.start()?;
    let end = query.end()?;
    let page = state
        .hoard
        .query(start, end, query.limit.unwrap_or(0))
        .await?;
    Ok(Json(BlobsResponse {
        blobs: page
            .entries
            .into_iter()
            .map(|e| BlobEntry {
                hash: e.id,
                time: e.time,
            })
            .collect(),
        start: page.start,
        end: page.end,
    }))
}

/// `GET /_stats`.
pub async fn stats(State(state): State<AppState>) -> ServerResult<Json<StatsResponse>> {
    Ok(Json(state.hoard.stats().await?))
}

/// Fallback for unknown paths, so they get the JSON error envelope too.
pub async fn not_found() -> ServerError {
    ServerError::RouteNotFound
}

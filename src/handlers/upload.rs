//! Upload lifecycle handlers.
//!
//! Caller keys are passed to the [`Uploader`](crate::uploader::Uploader)
//! verbatim; normalization happens in the protocol layer.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::errors::BulkError;
use crate::metrics::record_operation;
use crate::uploader::{UploadResponse, UploadStatus};
use crate::AppState;

/// `POST /uploads/{key}` -- Request an upload URL.
///
/// With the `complete` query flag the same route marks the upload
/// finished instead; see [`complete_upload`].
#[utoipa::path(
    post,
    path = "/uploads/{key}",
    tag = "Upload",
    operation_id = "RequestUpload",
    params(
        ("key" = String, Path, description = "Caller upload key"),
        ("complete" = Option<String>, Query,
            description = "Flag: mark the upload finished instead of requesting a URL")
    ),
    responses(
        (status = 200, description = "Upload URL", body = UploadResponse),
        (status = 204, description = "Upload completed (with `complete`)"),
        (status = 409, description = "Key already completed"),
        (status = 404, description = "Bucket not found, or no upload for this key (with `complete`)")
    )
)]
pub async fn request_upload(state: Arc<AppState>, key: &str) -> Result<Response, BulkError> {
    let result = state.uploader.request(key).await;
    record_operation("request", &result);
    Ok(Json(result?).into_response())
}

/// `POST /uploads/{key}?complete` -- Mark the upload finished.
///
/// Documented as the `complete` parameter of [`request_upload`].
pub async fn complete_upload(state: Arc<AppState>, key: &str) -> Result<Response, BulkError> {
    let result = state.uploader.complete(key).await;
    record_operation("complete", &result);
    result?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// `GET /uploads/{key}` -- Report the key's derived state.
#[utoipa::path(
    get,
    path = "/uploads/{key}",
    tag = "Upload",
    operation_id = "GetUploadStatus",
    params(("key" = String, Path, description = "Caller upload key")),
    responses(
        (status = 200, description = "Upload status", body = UploadStatus)
    )
)]
pub async fn upload_status(state: Arc<AppState>, key: &str) -> Result<Response, BulkError> {
    let result = state.uploader.status(key).await;
    record_operation("status", &result);
    Ok(Json(result?).into_response())
}

/// `DELETE /uploads/{key}` -- Remove the upload object.
#[utoipa::path(
    delete,
    path = "/uploads/{key}",
    tag = "Upload",
    operation_id = "DeleteUpload",
    params(("key" = String, Path, description = "Caller upload key")),
    responses(
        (status = 204, description = "Upload deleted"),
        (status = 404, description = "No upload for this key")
    )
)]
pub async fn delete_upload(state: Arc<AppState>, key: &str) -> Result<Response, BulkError> {
    let result = state.uploader.delete(key).await;
    record_operation("delete", &result);
    result?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

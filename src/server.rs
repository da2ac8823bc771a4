//! Axum router construction and upload route mapping.
//!
//! The [`app`] function wires every endpoint to its handler and returns a
//! ready-to-serve [`axum::Router`]. Like S3, one path carries several
//! operations: `POST /uploads/{key}` is a request unless the `complete`
//! query parameter is present.

use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::errors::{generate_request_id, BulkError};
use crate::metrics::{metrics_handler, metrics_middleware};
use crate::AppState;

// -- OpenAPI specification ----------------------------------------------------

/// OpenAPI documentation for the upload API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "bulkupload API",
        version = "0.1.0",
        description = "Single-writer, idempotent upload coordinator"
    ),
    paths(
        health_check,
        crate::handlers::upload::request_upload,
        crate::handlers::upload::upload_status,
        crate::handlers::upload::delete_upload,
    ),
    components(schemas(
        crate::uploader::UploadResponse,
        crate::uploader::UploadStatus,
        crate::meta::ObjectState,
    )),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Upload", description = "Upload lifecycle operations"),
    )
)]
pub struct ApiDoc;

/// Build the axum [`Router`] with all routes.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/openapi.json", get(openapi_json))
        .route(
            "/uploads/*key",
            post(handle_post_upload)
                .get(handle_get_upload)
                .delete(handle_delete_upload),
        )
        .with_state(state)
        // Inner layers run first, outer layers wrap them.
        .layer(middleware::from_fn(common_headers_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}

// -- Common headers middleware -----------------------------------------------

/// Adds `x-request-id`, `date` and `server` headers to every response.
async fn common_headers_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    // Error responses carry their own request id.
    if !headers.contains_key("x-request-id") {
        if let Ok(value) = HeaderValue::from_str(&generate_request_id()) {
            headers.insert("x-request-id", value);
        }
    }

    let date = httpdate::fmt_http_date(std::time::SystemTime::now());
    if let Ok(value) = HeaderValue::from_str(&date) {
        headers.insert("date", value);
    }
    headers.insert("server", HeaderValue::from_static("bulkupload"));

    response
}

// -- Health / docs -----------------------------------------------------------

/// `GET /health` -- Returns `{"status": "ok"}` with 200 OK.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "HealthCheck",
    responses(
        (status = 200, description = "Health check OK")
    )
)]
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        r#"{"status":"ok"}"#,
    )
}

/// `GET /openapi.json` -- The generated OpenAPI document.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

// -- Query parameter parsing helper ------------------------------------------

/// Parse raw query string into a HashMap.
fn parse_query(raw: Option<String>) -> HashMap<String, String> {
    let mut map = HashMap::new();
    if let Some(qs) = raw {
        for part in qs.split('&') {
            if let Some((k, v)) = part.split_once('=') {
                let decoded_k = percent_encoding::percent_decode_str(k)
                    .decode_utf8_lossy()
                    .into_owned();
                let decoded_v = percent_encoding::percent_decode_str(v)
                    .decode_utf8_lossy()
                    .into_owned();
                map.insert(decoded_k, decoded_v);
            } else if !part.is_empty() {
                // Flag parameters without a value, e.g. `?complete`.
                let decoded = percent_encoding::percent_decode_str(part)
                    .decode_utf8_lossy()
                    .into_owned();
                map.insert(decoded, String::new());
            }
        }
    }
    map
}

// -- Upload dispatch ---------------------------------------------------------

/// `POST /uploads/*key` -- dispatches based on query params:
/// - `?complete` -> CompleteUpload
/// - default -> RequestUpload
async fn handle_post_upload(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    RawQuery(raw_query): RawQuery,
) -> Result<Response, BulkError> {
    let query = parse_query(raw_query);

    if query.contains_key("complete") {
        crate::handlers::upload::complete_upload(state, &key).await
    } else {
        crate::handlers::upload::request_upload(state, &key).await
    }
}

/// `GET /uploads/*key` -- GetUploadStatus
async fn handle_get_upload(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response, BulkError> {
    crate::handlers::upload::upload_status(state, &key).await
}

/// `DELETE /uploads/*key` -- DeleteUpload
async fn handle_delete_upload(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response, BulkError> {
    crate::handlers::upload::delete_upload(state, &key).await
}

// -- Tests -------------------------------------------------------------------

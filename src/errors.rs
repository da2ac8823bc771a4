//! Error taxonomy for the upload protocol.
//!
//! Object store failures are translated exactly once, at the adapter
//! boundary, into [`BulkError::NotFound`] or [`BulkError::Unknown`].
//! Layers above the adapter never look at provider-specific codes.
//! The enum implements [`axum::response::IntoResponse`] so handlers can
//! return it directly.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::warn;

/// Provider error codes that mean the bucket or object is missing.
const NOT_FOUND_CODES: &[&str] = &["NoSuchBucket", "NoSuchKey", "NotFound"];

/// Generate a 16-character hex request ID.
pub fn generate_request_id() -> String {
    let bytes: [u8; 8] = rand::random();
    hex::encode(bytes).to_uppercase()
}

/// Errors surfaced by the object store adapter, meta objects and the uploader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BulkError {
    /// The bucket, object or ACL target does not exist.
    #[error("bulk: not found")]
    NotFound,

    /// The key has been completed and no longer accepts upload requests.
    #[error("bulk: object is immutable now")]
    Immutable,

    /// Any backend failure not recognised as `NotFound`.
    #[error("bulk: error unknown")]
    Unknown,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BulkError>;

impl BulkError {
    /// Translate a provider error into the crate taxonomy.
    ///
    /// `code` is the provider's error code, if the failure carried one.
    /// Unrecognised failures are logged with full detail before being
    /// collapsed to [`BulkError::Unknown`].
    pub fn from_provider(operation: &str, code: Option<&str>, detail: &dyn fmt::Debug) -> Self {
        match code {
            Some(code) if NOT_FOUND_CODES.contains(&code) => BulkError::NotFound,
            _ => {
                warn!(
                    operation,
                    code = code.unwrap_or("<none>"),
                    "unknown object store error: {:?}",
                    detail
                );
                BulkError::Unknown
            }
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            BulkError::NotFound => "NotFound",
            BulkError::Immutable => "Immutable",
            BulkError::Unknown => "Unknown",
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            BulkError::NotFound => StatusCode::NOT_FOUND,
            BulkError::Immutable => StatusCode::CONFLICT,
            BulkError::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BulkError {
    fn into_response(self) -> Response {
        let request_id = generate_request_id();
        let body = serde_json::json!({
            "code": self.code(),
            "message": self.to_string(),
        });

        (
            self.status_code(),
            [
                ("content-type", "application/json".to_string()),
                ("x-request-id", request_id),
            ],
            body.to_string(),
        )
            .into_response()
    }
}

//! bulkupload library -- single-writer, idempotent uploads over S3.
//!
//! A caller key is hashed to an object name; the object's ACL is the only
//! record of where the upload stands. A public read-write object is an
//! open upload slot, a public-read object is a completed, immutable one.
//! No metadata database is involved.

use std::sync::Arc;

pub mod acl;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod key;
pub mod meta;
pub mod metrics;
pub mod server;
pub mod storage;
pub mod uploader;

use crate::config::Config;
use crate::uploader::Uploader;

/// Shared application state passed to all handlers via `axum::extract::State`.
pub struct AppState {
    /// Service configuration.
    pub config: Config,
    /// Upload protocol over the configured object store.
    pub uploader: Arc<dyn Uploader>,
}

//! Upload request/complete/delete protocol.
//!
//! The uploader keeps no local state. Each call normalizes the caller's
//! key, resolves a meta object for it and reads or mutates the backend
//! object directly, so a key's history lives entirely in the store:
//!
//! - `request` hands out an upload URL as long as the object is not
//!   read-only, (re)creating it with public read-write access.
//! - `complete` flips the object to public-read; later `request`s fail
//!   with [`BulkError::Immutable`].
//! - `delete` removes the object; the key then behaves as brand new.
//!
//! Concurrent `request` and `complete` on the same key race in the
//! backend and are not serialized here.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::errors::{BulkError, Result};
use crate::key::normalize_key;
use crate::meta::{MetaObject, MetaService, ObjectState};
use crate::storage::store::StoreFuture;

/// Response to an upload request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// URL the caller uploads to (and later downloads from).
    pub url: String,
}

/// Current view of one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadStatus {
    /// Caller key as supplied.
    pub key: String,
    /// Normalized storage object name.
    pub object: String,
    /// Derived lifecycle state.
    pub state: ObjectState,
    /// URL of the object.
    pub url: String,
}

/// Upload lifecycle operations keyed by caller-supplied strings.
pub trait Uploader: Send + Sync + 'static {
    /// Request an upload URL for `key`. Repeated requests get a usable URL
    /// each time until the key is completed.
    fn request<'a>(&'a self, key: &'a str) -> StoreFuture<'a, UploadResponse>;

    /// Mark the upload for `key` as finished; no further uploads are accepted.
    fn complete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;

    /// Remove the object for `key`.
    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;

    /// Report the derived state of `key`.
    fn status<'a>(&'a self, key: &'a str) -> StoreFuture<'a, UploadStatus>;
}

/// [`Uploader`] over a [`MetaService`], storing every key in one bucket.
pub struct DefaultUploader<S: MetaService> {
    service: S,
    bucket: String,
}

impl<S: MetaService> DefaultUploader<S> {
    pub fn new(service: S, bucket: impl Into<String>) -> Self {
        Self {
            service,
            bucket: bucket.into(),
        }
    }

    /// Bucket all keys are stored in.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Create the uploader's bucket if it does not exist yet.
    pub async fn prepare_bucket(&self) -> Result<()> {
        // Bucket-level operations ignore the object name.
        self.service.object(&self.bucket, "")?.new_bucket().await
    }

    fn resolve(&self, key: &str) -> Result<S::Object> {
        self.service.object(&self.bucket, &normalize_key(key))
    }
}

impl<S: MetaService> Uploader for DefaultUploader<S> {
    fn request<'a>(&'a self, key: &'a str) -> StoreFuture<'a, UploadResponse> {
        Box::pin(async move {
            let object = self.resolve(key)?;

            match object.is_read_only().await {
                Ok(true) => {
                    debug!("request for completed key {:?} rejected", key);
                    return Err(BulkError::Immutable);
                }
                // Present and still writable: hand out the URL again.
                Ok(false) | Err(BulkError::NotFound) => {}
                Err(e) => return Err(e),
            }

            object.new_object().await?;
            let url = object.uri();
            info!("upload requested: key={:?} object={}", key, object.object_name());
            Ok(UploadResponse { url })
        })
    }

    fn complete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let object = self.resolve(key)?;
            object.mark_read().await?;
            info!("upload completed: key={:?} object={}", key, object.object_name());
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let object = self.resolve(key)?;
            object.remove_object().await?;
            info!("upload deleted: key={:?} object={}", key, object.object_name());
            Ok(())
        })
    }

    fn status<'a>(&'a self, key: &'a str) -> StoreFuture<'a, UploadStatus> {
        Box::pin(async move {
            let object = self.resolve(key)?;
            let state = object.state().await?;
            Ok(UploadStatus {
                key: key.to_string(),
                object: object.object_name().to_string(),
                state,
                url: object.uri(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::{CannedAcl, Grant};
    use crate::meta::s3::{S3MetaService, DEFAULT_DOMAIN};
    use crate::storage::memory::MemoryObjectStore;
    use crate::storage::store::ObjectStore;
    use std::sync::Arc;

    const BUCKET: &str = "testforunittest";

    async fn uploader() -> (Arc<MemoryObjectStore>, DefaultUploader<S3MetaService>) {
        let store = Arc::new(MemoryObjectStore::new());
        let uploader =
            DefaultUploader::new(S3MetaService::new(store.clone(), DEFAULT_DOMAIN), BUCKET);
        uploader.prepare_bucket().await.unwrap();
        (store, uploader)
    }

    /// Store whose ACL reads always fail with an unrecognised error.
    struct BrokenAclStore;

    impl ObjectStore for BrokenAclStore {
        fn bucket_exists(&self, _bucket: &str) -> StoreFuture<'_, ()> {
            Box::pin(async { Ok(()) })
        }
        fn create_bucket(&self, _bucket: &str, _acl: CannedAcl) -> StoreFuture<'_, ()> {
            Box::pin(async { Ok(()) })
        }
        fn put_object(&self, _bucket: &str, _key: &str, _acl: CannedAcl) -> StoreFuture<'_, ()> {
            Box::pin(async { Ok(()) })
        }
        fn delete_object(&self, _bucket: &str, _key: &str) -> StoreFuture<'_, ()> {
            Box::pin(async { Ok(()) })
        }
        fn get_object_acl(&self, _bucket: &str, _key: &str) -> StoreFuture<'_, Vec<Grant>> {
            Box::pin(async { Err(BulkError::Unknown) })
        }
        fn put_object_acl(
            &self,
            _bucket: &str,
            _key: &str,
            _acl: CannedAcl,
        ) -> StoreFuture<'_, ()> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn test_request_returns_url() {
        let (_, uploader) = uploader().await;
        let resp = uploader.request("k").await.unwrap();
        assert_eq!(
            resp.url,
            format!("https://{BUCKET}.{DEFAULT_DOMAIN}/{}", normalize_key("k"))
        );
    }

    #[tokio::test]
    async fn test_request_twice_succeeds() {
        let (store, uploader) = uploader().await;
        let first = uploader.request("k").await.unwrap();
        let second = uploader.request("k").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.object_count(BUCKET).await, 1);
    }

    #[tokio::test]
    async fn test_request_after_complete_is_immutable() {
        let (_, uploader) = uploader().await;
        uploader.request("k").await.unwrap();
        uploader.complete("k").await.unwrap();
        assert_eq!(uploader.request("k").await, Err(BulkError::Immutable));
        assert_eq!(uploader.request("k").await, Err(BulkError::Immutable));
    }

    #[tokio::test]
    async fn test_delete_after_complete_forgets_key() {
        let (_, uploader) = uploader().await;
        uploader.request("k").await.unwrap();
        uploader.complete("k").await.unwrap();
        uploader.delete("k").await.unwrap();

        let resp = uploader.request("k").await.unwrap();
        assert!(resp.url.ends_with(&normalize_key("k")));
        assert_eq!(
            uploader.status("k").await.unwrap().state,
            ObjectState::Writable
        );
    }

    #[tokio::test]
    async fn test_complete_missing_key() {
        let (_, uploader) = uploader().await;
        assert_eq!(uploader.complete("nope").await, Err(BulkError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_missing_key() {
        let (_, uploader) = uploader().await;
        assert_eq!(uploader.delete("nope").await, Err(BulkError::NotFound));
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let (_, uploader) = uploader().await;
        uploader.request("a").await.unwrap();
        uploader.complete("a").await.unwrap();
        uploader.request("b").await.unwrap();
        assert_eq!(uploader.request("a").await, Err(BulkError::Immutable));
    }

    #[tokio::test]
    async fn test_status_lifecycle() {
        let (_, uploader) = uploader().await;
        let status = uploader.status("k").await.unwrap();
        assert_eq!(status.state, ObjectState::Absent);
        assert_eq!(status.key, "k");
        assert_eq!(status.object, normalize_key("k"));

        uploader.request("k").await.unwrap();
        assert_eq!(
            uploader.status("k").await.unwrap().state,
            ObjectState::Writable
        );

        uploader.complete("k").await.unwrap();
        assert_eq!(
            uploader.status("k").await.unwrap().state,
            ObjectState::ReadOnly
        );
    }

    #[tokio::test]
    async fn test_request_without_bucket_is_not_found() {
        let store = Arc::new(MemoryObjectStore::new());
        let uploader = DefaultUploader::new(S3MetaService::new(store, DEFAULT_DOMAIN), BUCKET);
        assert_eq!(uploader.request("k").await, Err(BulkError::NotFound));
    }

    #[tokio::test]
    async fn test_request_propagates_unknown() {
        let uploader = DefaultUploader::new(
            S3MetaService::new(Arc::new(BrokenAclStore), DEFAULT_DOMAIN),
            BUCKET,
        );
        assert_eq!(uploader.request("k").await, Err(BulkError::Unknown));
    }

    #[tokio::test]
    async fn test_prepare_bucket_is_idempotent() {
        let (store, uploader) = uploader().await;
        uploader.prepare_bucket().await.unwrap();
        assert_eq!(store.bucket_creations(), 1);
        assert_eq!(uploader.bucket(), BUCKET);
    }
}

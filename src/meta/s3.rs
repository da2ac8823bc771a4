//! Meta objects over an S3-style [`ObjectStore`].

use std::sync::Arc;

use tracing::{debug, info};

use super::{MetaObject, MetaService, ObjectState};
use crate::acl::{is_public_read_only, is_public_writable, CannedAcl, Grant};
use crate::errors::{BulkError, Result};
use crate::storage::store::{ObjectStore, StoreFuture};

/// Default public domain objects are served from.
pub const DEFAULT_DOMAIN: &str = "s3.amazonaws.com";

/// Stateless factory for [`S3MetaObject`] handles.
#[derive(Clone)]
pub struct S3MetaService {
    store: Arc<dyn ObjectStore>,
    domain: Arc<str>,
}

impl S3MetaService {
    /// Create a service over `store`, building URIs under `domain`.
    pub fn new(store: Arc<dyn ObjectStore>, domain: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            domain: domain.into(),
        }
    }
}

impl MetaService for S3MetaService {
    type Object = S3MetaObject;

    fn object(&self, bucket: &str, object_name: &str) -> Result<S3MetaObject> {
        Ok(S3MetaObject {
            store: self.store.clone(),
            domain: self.domain.clone(),
            bucket: bucket.to_string(),
            object_name: object_name.to_string(),
        })
    }
}

/// Handle over one `(bucket, object name)` in an [`ObjectStore`].
#[derive(Clone)]
pub struct S3MetaObject {
    store: Arc<dyn ObjectStore>,
    domain: Arc<str>,
    bucket: String,
    object_name: String,
}

impl S3MetaObject {
    async fn grants(&self) -> Result<Vec<Grant>> {
        self.store
            .get_object_acl(&self.bucket, &self.object_name)
            .await
    }
}

impl MetaObject for S3MetaObject {
    /// Test-and-create. Two callers may both see `NotFound` and both try to
    /// create; the backend's idempotent create absorbs the second attempt.
    /// Any other lookup failure is returned without attempting a create.
    fn new_bucket(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            match self.bucket_exists().await {
                Ok(()) => {
                    debug!("bucket {} already exists", self.bucket);
                    Ok(())
                }
                Err(BulkError::NotFound) => {
                    info!("creating bucket {}", self.bucket);
                    self.store
                        .create_bucket(&self.bucket, CannedAcl::PublicReadWrite)
                        .await
                }
                Err(e) => Err(e),
            }
        })
    }

    fn bucket_exists(&self) -> StoreFuture<'_, ()> {
        self.store.bucket_exists(&self.bucket)
    }

    fn new_object(&self) -> StoreFuture<'_, ()> {
        self.store
            .put_object(&self.bucket, &self.object_name, CannedAcl::PublicReadWrite)
    }

    fn remove_object(&self) -> StoreFuture<'_, ()> {
        self.store.delete_object(&self.bucket, &self.object_name)
    }

    /// Only effective when the object owner is also the bucket owner; S3
    /// refuses the ACL change otherwise. Buckets with ACLs disabled
    /// (`BucketOwnerEnforced`) or with Block Public Access on reject it too.
    fn mark_read(&self) -> StoreFuture<'_, ()> {
        self.store
            .put_object_acl(&self.bucket, &self.object_name, CannedAcl::PublicRead)
    }

    fn uri(&self) -> String {
        format!(
            "https://{}.{}/{}",
            self.bucket, self.domain, self.object_name
        )
    }

    fn is_writable(&self) -> StoreFuture<'_, bool> {
        Box::pin(async move { Ok(is_public_writable(&self.grants().await?)) })
    }

    fn is_read_only(&self) -> StoreFuture<'_, bool> {
        Box::pin(async move { Ok(is_public_read_only(&self.grants().await?)) })
    }

    fn state(&self) -> StoreFuture<'_, ObjectState> {
        Box::pin(async move {
            match self.grants().await {
                Ok(grants) => Ok(ObjectState::from_grants(&grants)),
                Err(BulkError::NotFound) => Ok(ObjectState::Absent),
                Err(e) => Err(e),
            }
        })
    }

    fn object_name(&self) -> &str {
        &self.object_name
    }
}

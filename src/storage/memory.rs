//! In-memory object store.
//!
//! Buckets, objects and their grant lists live in a
//! `tokio::sync::RwLock<HashMap<...>>`. Semantics follow S3 closely
//! enough for the upload protocol: missing buckets and keys report
//! `NotFound`, canned ACLs expand into the grants S3 would store, and
//! re-creating a bucket the store already owns is a no-op.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use super::store::{ObjectStore, StoreFuture};
use crate::acl::{CannedAcl, Grant, Grantee};
use crate::errors::BulkError;

/// Canonical user ID the memory store reports as owner of everything.
const MEMORY_OWNER_ID: &str = "bulkupload";

#[derive(Debug, Default)]
struct MemoryBucket {
    /// Bucket ACL grants.
    acl: Vec<Grant>,
    /// Object name -> ACL grants. Objects carry no data.
    objects: HashMap<String, Vec<Grant>>,
}

/// In-memory object store.
pub struct MemoryObjectStore {
    buckets: tokio::sync::RwLock<HashMap<String, MemoryBucket>>,
    owner: Grantee,
    /// Number of buckets actually created (idempotent re-creates excluded).
    bucket_creations: AtomicU64,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            buckets: tokio::sync::RwLock::new(HashMap::new()),
            owner: Grantee::CanonicalUser {
                id: MEMORY_OWNER_ID.to_string(),
                display_name: Some(MEMORY_OWNER_ID.to_string()),
            },
            bucket_creations: AtomicU64::new(0),
        }
    }

    /// How many buckets have been created since construction.
    pub fn bucket_creations(&self) -> u64 {
        self.bucket_creations.load(Ordering::Relaxed)
    }

    /// Grants the bucket was created with, if it exists.
    pub async fn bucket_acl(&self, bucket: &str) -> Option<Vec<Grant>> {
        self.buckets.read().await.get(bucket).map(|b| b.acl.clone())
    }

    /// Number of objects currently held in `bucket` (0 if it does not exist).
    pub async fn object_count(&self, bucket: &str) -> usize {
        self.buckets
            .read()
            .await
            .get(bucket)
            .map_or(0, |b| b.objects.len())
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn bucket_exists(&self, bucket: &str) -> StoreFuture<'_, ()> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            if self.buckets.read().await.contains_key(&bucket) {
                Ok(())
            } else {
                Err(BulkError::NotFound)
            }
        })
    }

    fn create_bucket(&self, bucket: &str, acl: CannedAcl) -> StoreFuture<'_, ()> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            let mut buckets = self.buckets.write().await;
            if buckets.contains_key(&bucket) {
                // S3 BucketAlreadyOwnedByYou; single owner here, so always ours.
                debug!("memory create_bucket: {} already exists", bucket);
                return Ok(());
            }
            buckets.insert(
                bucket.clone(),
                MemoryBucket {
                    acl: acl.grants(&self.owner),
                    objects: HashMap::new(),
                },
            );
            self.bucket_creations.fetch_add(1, Ordering::Relaxed);
            debug!("memory create_bucket: {} acl={}", bucket, acl.as_str());
            Ok(())
        })
    }

    fn put_object(&self, bucket: &str, key: &str, acl: CannedAcl) -> StoreFuture<'_, ()> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            let mut buckets = self.buckets.write().await;
            let entry = buckets.get_mut(&bucket).ok_or(BulkError::NotFound)?;
            debug!("memory put_object: {}/{} acl={}", bucket, key, acl.as_str());
            entry.objects.insert(key, acl.grants(&self.owner));
            Ok(())
        })
    }

    fn delete_object(&self, bucket: &str, key: &str) -> StoreFuture<'_, ()> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            let mut buckets = self.buckets.write().await;
            let entry = buckets.get_mut(&bucket).ok_or(BulkError::NotFound)?;
            entry
                .objects
                .remove(&key)
                .map(|_| ())
                .ok_or(BulkError::NotFound)
        })
    }

    fn get_object_acl(&self, bucket: &str, key: &str) -> StoreFuture<'_, Vec<Grant>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            let buckets = self.buckets.read().await;
            let entry = buckets.get(&bucket).ok_or(BulkError::NotFound)?;
            entry.objects.get(&key).cloned().ok_or(BulkError::NotFound)
        })
    }

    fn put_object_acl(&self, bucket: &str, key: &str, acl: CannedAcl) -> StoreFuture<'_, ()> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            let mut buckets = self.buckets.write().await;
            let entry = buckets.get_mut(&bucket).ok_or(BulkError::NotFound)?;
            let grants = entry.objects.get_mut(&key).ok_or(BulkError::NotFound)?;
            *grants = acl.grants(&self.owner);
            debug!(
                "memory put_object_acl: {}/{} acl={}",
                bucket,
                key,
                acl.as_str()
            );
            Ok(())
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::{is_public_read_only, is_public_writable, Permission};

    #[tokio::test]
    async fn test_bucket_exists_missing() {
        let store = MemoryObjectStore::new();
        assert_eq!(
            store.bucket_exists("b1").await,
            Err(BulkError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_create_bucket_is_idempotent() {
        let store = MemoryObjectStore::new();
        store
            .create_bucket("b1", CannedAcl::PublicReadWrite)
            .await
            .unwrap();
        store
            .create_bucket("b1", CannedAcl::PublicReadWrite)
            .await
            .unwrap();
        store.bucket_exists("b1").await.unwrap();
        assert_eq!(store.bucket_creations(), 1);

        let acl = store.bucket_acl("b1").await.unwrap();
        assert!(is_public_writable(&acl));
    }

    #[tokio::test]
    async fn test_put_object_into_missing_bucket() {
        let store = MemoryObjectStore::new();
        assert_eq!(
            store.put_object("b1", "k", CannedAcl::PublicReadWrite).await,
            Err(BulkError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_put_object_grants() {
        let store = MemoryObjectStore::new();
        store.create_bucket("b1", CannedAcl::Private).await.unwrap();
        store
            .put_object("b1", "k", CannedAcl::PublicReadWrite)
            .await
            .unwrap();

        let grants = store.get_object_acl("b1", "k").await.unwrap();
        assert_eq!(grants[0].permission, Permission::FullControl);
        assert!(is_public_writable(&grants));
    }

    #[tokio::test]
    async fn test_put_object_acl_replaces_grants() {
        let store = MemoryObjectStore::new();
        store.create_bucket("b1", CannedAcl::Private).await.unwrap();
        store
            .put_object("b1", "k", CannedAcl::PublicReadWrite)
            .await
            .unwrap();
        store
            .put_object_acl("b1", "k", CannedAcl::PublicRead)
            .await
            .unwrap();

        let grants = store.get_object_acl("b1", "k").await.unwrap();
        assert!(is_public_read_only(&grants));
        assert!(!is_public_writable(&grants));
    }

    #[tokio::test]
    async fn test_put_object_acl_missing_key() {
        let store = MemoryObjectStore::new();
        store.create_bucket("b1", CannedAcl::Private).await.unwrap();
        assert_eq!(
            store.put_object_acl("b1", "k", CannedAcl::PublicRead).await,
            Err(BulkError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_delete_object() {
        let store = MemoryObjectStore::new();
        store.create_bucket("b1", CannedAcl::Private).await.unwrap();
        store
            .put_object("b1", "k", CannedAcl::PublicReadWrite)
            .await
            .unwrap();
        assert_eq!(store.object_count("b1").await, 1);

        store.delete_object("b1", "k").await.unwrap();
        assert_eq!(store.object_count("b1").await, 0);
        assert_eq!(
            store.delete_object("b1", "k").await,
            Err(BulkError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_get_object_acl_missing_bucket() {
        let store = MemoryObjectStore::new();
        assert_eq!(
            store.get_object_acl("nope", "k").await,
            Err(BulkError::NotFound)
        );
    }
}

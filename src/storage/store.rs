//! Abstract object store trait.
//!
//! Every object store adapter must implement [`ObjectStore`]. The trait
//! only covers what the upload protocol needs: bucket existence and
//! creation, empty-object creation and deletion, and object ACL reads and
//! writes. Implementations translate their native errors into
//! [`BulkError::NotFound`](crate::errors::BulkError::NotFound) or
//! [`BulkError::Unknown`](crate::errors::BulkError::Unknown) before
//! returning.

use std::future::Future;
use std::pin::Pin;

use crate::acl::{CannedAcl, Grant};
use crate::errors::Result;

/// Boxed, `Send` future returned by the async traits in this crate.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Async object store contract.
pub trait ObjectStore: Send + Sync + 'static {
    /// Succeeds iff the bucket's location can be retrieved.
    fn bucket_exists(&self, bucket: &str) -> StoreFuture<'_, ()>;

    /// Create `bucket` with the given canned ACL.
    fn create_bucket(&self, bucket: &str, acl: CannedAcl) -> StoreFuture<'_, ()>;

    /// Create (or overwrite) an empty object with the given canned ACL.
    fn put_object(&self, bucket: &str, key: &str, acl: CannedAcl) -> StoreFuture<'_, ()>;

    /// Delete an object. Fails with `NotFound` if it does not exist.
    fn delete_object(&self, bucket: &str, key: &str) -> StoreFuture<'_, ()>;

    /// Fetch the object's ACL grants.
    fn get_object_acl(&self, bucket: &str, key: &str) -> StoreFuture<'_, Vec<Grant>>;

    /// Replace the object's ACL with the given canned ACL.
    fn put_object_acl(&self, bucket: &str, key: &str, acl: CannedAcl) -> StoreFuture<'_, ()>;
}

//! Meta objects: stateless handles over one backend object's lifecycle.
//!
//! A [`MetaObject`] is bound to a `(bucket, object name)` pair and owns
//! nothing else. Whether the object is absent, writable or read-only is
//! always derived from the store on demand via its ACL grants; nothing is
//! cached on the handle.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::acl::{is_public_read_only, is_public_writable, Grant};
use crate::errors::Result;
use crate::storage::store::StoreFuture;

pub mod s3;

/// Lifecycle state of an upload object, as derived from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ObjectState {
    /// No object exists under this name.
    Absent,
    /// The object carries the public WRITE grant.
    Writable,
    /// The object carries public READ only.
    ReadOnly,
    /// The object exists with neither public grant.
    Private,
}

impl ObjectState {
    /// Classify an existing object's grant set.
    pub fn from_grants(grants: &[Grant]) -> Self {
        if is_public_writable(grants) {
            ObjectState::Writable
        } else if is_public_read_only(grants) {
            ObjectState::ReadOnly
        } else {
            ObjectState::Private
        }
    }
}

/// Lifecycle operations on one backend object.
pub trait MetaObject: Send + Sync {
    /// Create the bound bucket unless it already exists (test-and-create).
    fn new_bucket(&self) -> StoreFuture<'_, ()>;

    /// Succeeds iff the bound bucket exists.
    fn bucket_exists(&self) -> StoreFuture<'_, ()>;

    /// Create the object with public read-write access, overwriting any
    /// existing object of the same name.
    fn new_object(&self) -> StoreFuture<'_, ()>;

    /// Remove the object. Fails with `NotFound` if absent.
    fn remove_object(&self) -> StoreFuture<'_, ()>;

    /// Make the object read-only by replacing its ACL with public-read.
    fn mark_read(&self) -> StoreFuture<'_, ()>;

    /// Public URI of the object. Pure; performs no I/O.
    fn uri(&self) -> String;

    /// Whether the object currently grants public write.
    fn is_writable(&self) -> StoreFuture<'_, bool>;

    /// Whether the object is currently public-read only.
    fn is_read_only(&self) -> StoreFuture<'_, bool>;

    /// Derived lifecycle state; a missing object is `Absent`, not an error.
    fn state(&self) -> StoreFuture<'_, ObjectState>;

    /// Storage name of the bound object.
    fn object_name(&self) -> &str;
}

/// Resolves `(bucket, object name)` pairs to [`MetaObject`] handles.
pub trait MetaService: Send + Sync + 'static {
    /// Handle type produced by this service.
    type Object: MetaObject;

    /// Build a handle. Implementations may validate eagerly and fail here;
    /// the S3 service never does.
    fn object(&self, bucket: &str, object_name: &str) -> Result<Self::Object>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::{CannedAcl, Grantee};

    fn owner() -> Grantee {
        Grantee::CanonicalUser {
            id: "owner".to_string(),
            display_name: None,
        }
    }

    #[test]
    fn test_state_from_grants() {
        assert_eq!(
            ObjectState::from_grants(&CannedAcl::PublicReadWrite.grants(&owner())),
            ObjectState::Writable
        );
        assert_eq!(
            ObjectState::from_grants(&CannedAcl::PublicRead.grants(&owner())),
            ObjectState::ReadOnly
        );
        assert_eq!(
            ObjectState::from_grants(&CannedAcl::Private.grants(&owner())),
            ObjectState::Private
        );
    }

    #[test]
    fn test_state_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ObjectState::ReadOnly).unwrap(),
            "\"read_only\""
        );
        assert_eq!(
            serde_json::to_string(&ObjectState::Absent).unwrap(),
            "\"absent\""
        );
    }
}

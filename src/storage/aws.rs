//! AWS S3 object store adapter.
//!
//! Talks to S3 (or any S3-compatible endpoint such as MinIO or LocalStack)
//! through the official SDK. Every SDK failure is handed to
//! [`BulkError::from_provider`] together with its S3 error code, so only
//! `NotFound` and `Unknown` ever leave this module.
//!
//! Credentials are resolved via the standard AWS credential chain
//! (env vars, `~/.aws/credentials`, IAM role, etc.) unless static keys
//! are supplied.
//!
//! Upload state lives in object ACLs, so the bucket must accept them.
//! Buckets created here use `ObjectWriter` ownership (ACLs enabled). New
//! AWS buckets also default to Block Public Access, which rejects public
//! canned ACLs with an `Unknown` error; an account- or bucket-level block
//! has to be lifted out of band, or the bucket pre-created without it and
//! `uploader.create_bucket` set to `false`.

use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::create_bucket::builders::CreateBucketFluentBuilder;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketCannedAcl, BucketLocationConstraint, CreateBucketConfiguration, ObjectCannedAcl,
    ObjectOwnership, Type,
};
use aws_sdk_s3::Client;
use tracing::{debug, info};

use super::store::{ObjectStore, StoreFuture};
use crate::acl::{CannedAcl, Grant, Grantee, Permission};
use crate::errors::BulkError;

/// Region in which S3 rejects an explicit location constraint.
const DEFAULT_REGION: &str = "us-east-1";

/// Error code S3 returns when the caller already owns the bucket.
const ALREADY_OWNED_CODE: &str = "BucketAlreadyOwnedByYou";

/// Object store adapter backed by AWS S3.
pub struct AwsObjectStore {
    /// AWS S3 SDK client.
    client: Client,
    /// Region buckets are created in.
    region: String,
}

impl AwsObjectStore {
    /// Create a new S3 adapter.
    ///
    /// Loads AWS credentials from the default credential chain unless
    /// `access_key_id` and `secret_access_key` are both provided.
    pub async fn new(
        region: String,
        endpoint_url: Option<String>,
        use_path_style: bool,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
    ) -> anyhow::Result<Self> {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.clone()));

        if let Some(ref endpoint) = endpoint_url {
            config_loader = config_loader.endpoint_url(endpoint);
        }

        if let (Some(ref ak), Some(ref sk)) = (&access_key_id, &secret_access_key) {
            let creds = aws_sdk_s3::config::Credentials::new(
                ak,
                sk,
                None, // session_token
                None, // expiry
                "bulkupload-config",
            );
            config_loader = config_loader.credentials_provider(creds);
        }

        let sdk_config = config_loader.load().await;

        let s3_config_builder =
            aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(use_path_style);

        let client = Client::from_conf(s3_config_builder.build());

        info!(
            "AWS object store initialized: region={} endpoint={}",
            region,
            endpoint_url.as_deref().unwrap_or("<default>")
        );

        Ok(Self { client, region })
    }

    /// Translate an SDK error, keeping its S3 error code.
    fn translate<E, R>(operation: &str, err: SdkError<E, R>) -> BulkError
    where
        E: ProvideErrorMetadata + std::fmt::Debug,
        R: std::fmt::Debug,
    {
        BulkError::from_provider(operation, err.code(), &err)
    }

    /// CreateBucket request with ACLs enabled and, outside us-east-1, a
    /// location constraint.
    fn create_bucket_request(&self, bucket: &str, acl: CannedAcl) -> CreateBucketFluentBuilder {
        let mut req = self
            .client
            .create_bucket()
            .bucket(bucket)
            .acl(BucketCannedAcl::from(acl.as_str()))
            // The default BucketOwnerEnforced disables ACLs entirely.
            .object_ownership(ObjectOwnership::ObjectWriter);

        if let Some(constraint) = location_constraint(&self.region) {
            req = req.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(constraint))
                    .build(),
            );
        }
        req
    }
}

impl ObjectStore for AwsObjectStore {
    fn bucket_exists(&self, bucket: &str) -> StoreFuture<'_, ()> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            debug!("AWS get_bucket_location: bucket={}", bucket);
            self.client
                .get_bucket_location()
                .bucket(&bucket)
                .send()
                .await
                .map_err(|e| Self::translate("GetBucketLocation", e))?;
            Ok(())
        })
    }

    fn create_bucket(&self, bucket: &str, acl: CannedAcl) -> StoreFuture<'_, ()> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            debug!("AWS create_bucket: bucket={} acl={}", bucket, acl.as_str());

            match self.create_bucket_request(&bucket, acl).send().await {
                Ok(_) => Ok(()),
                // Lost the test-and-create race against ourselves.
                Err(e) if is_benign_create_error(e.code()) => {
                    debug!("AWS create_bucket: {} already owned", bucket);
                    Ok(())
                }
                Err(e) => Err(Self::translate("CreateBucket", e)),
            }
        })
    }

    fn put_object(&self, bucket: &str, key: &str, acl: CannedAcl) -> StoreFuture<'_, ()> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            debug!(
                "AWS put_object: bucket={} key={} acl={}",
                bucket,
                key,
                acl.as_str()
            );
            self.client
                .put_object()
                .bucket(&bucket)
                .key(&key)
                .acl(ObjectCannedAcl::from(acl.as_str()))
                .body(ByteStream::from_static(b""))
                .send()
                .await
                .map_err(|e| Self::translate("PutObject", e))?;
            Ok(())
        })
    }

    fn delete_object(&self, bucket: &str, key: &str) -> StoreFuture<'_, ()> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            // S3 delete_object is idempotent, so probe first to report NotFound.
            debug!("AWS head_object: bucket={} key={}", bucket, key);
            if let Err(e) = self
                .client
                .head_object()
                .bucket(&bucket)
                .key(&key)
                .send()
                .await
            {
                let service_err = e.into_service_error();
                if service_err.is_not_found() {
                    return Err(BulkError::NotFound);
                }
                return Err(BulkError::from_provider(
                    "HeadObject",
                    service_err.meta().code(),
                    &service_err,
                ));
            }

            debug!("AWS delete_object: bucket={} key={}", bucket, key);
            self.client
                .delete_object()
                .bucket(&bucket)
                .key(&key)
                .send()
                .await
                .map_err(|e| Self::translate("DeleteObject", e))?;
            Ok(())
        })
    }

    fn get_object_acl(&self, bucket: &str, key: &str) -> StoreFuture<'_, Vec<Grant>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            debug!("AWS get_object_acl: bucket={} key={}", bucket, key);
            let resp = self
                .client
                .get_object_acl()
                .bucket(&bucket)
                .key(&key)
                .send()
                .await
                .map_err(|e| Self::translate("GetObjectAcl", e))?;

            Ok(resp.grants().iter().filter_map(convert_grant).collect())
        })
    }

    fn put_object_acl(&self, bucket: &str, key: &str, acl: CannedAcl) -> StoreFuture<'_, ()> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            debug!(
                "AWS put_object_acl: bucket={} key={} acl={}",
                bucket,
                key,
                acl.as_str()
            );
            self.client
                .put_object_acl()
                .bucket(&bucket)
                .key(&key)
                .acl(ObjectCannedAcl::from(acl.as_str()))
                .send()
                .await
                .map_err(|e| Self::translate("PutObjectAcl", e))?;
            Ok(())
        })
    }
}

// -- Helpers ------------------------------------------------------------------

/// Location constraint to send on CreateBucket, if any.
fn location_constraint(region: &str) -> Option<&str> {
    if region.is_empty() || region == DEFAULT_REGION {
        None
    } else {
        Some(region)
    }
}

/// Whether a CreateBucket failure just means the bucket is already ours.
fn is_benign_create_error(code: Option<&str>) -> bool {
    code == Some(ALREADY_OWNED_CODE)
}

/// Convert an SDK grant. Grants with unknown grantee types or permissions
/// are dropped; they can never equal a canonical grant anyway.
fn convert_grant(grant: &aws_sdk_s3::types::Grant) -> Option<Grant> {
    let permission = Permission::parse(grant.permission()?.as_str())?;
    let grantee = grant.grantee()?;
    let grantee = match grantee.r#type() {
        Type::CanonicalUser => Grantee::CanonicalUser {
            id: grantee.id()?.to_string(),
            display_name: grantee.display_name().map(str::to_string),
        },
        Type::Group => Grantee::Group {
            uri: grantee.uri()?.to_string(),
        },
        Type::AmazonCustomerByEmail => Grantee::Email {
            address: grantee.email_address()?.to_string(),
        },
        other => {
            debug!("skipping grant with unsupported grantee type {:?}", other);
            return None;
        }
    };
    Some(Grant {
        grantee,
        permission,
    })
}

// -- Tests -------------------------------------------------------------------

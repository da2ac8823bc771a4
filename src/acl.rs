//! Access control list types.
//!
//! Object mutability is encoded entirely in ACL grants: a writable upload
//! slot carries the public WRITE grant, a completed one carries only the
//! public READ grant. The canonical grants here are compared structurally
//! against whatever the store reports.

use serde::{Deserialize, Serialize};

/// Group URI for the anonymous / all-users principal.
pub const ALL_USERS_URI: &str = "http://acs.amazonaws.com/groups/global/AllUsers";

/// A permission in an ACL grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    FullControl,
    Read,
    ReadAcp,
    Write,
    WriteAcp,
}

impl Permission {
    /// Wire name, e.g. `READ` or `FULL_CONTROL`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::FullControl => "FULL_CONTROL",
            Permission::Read => "READ",
            Permission::ReadAcp => "READ_ACP",
            Permission::Write => "WRITE",
            Permission::WriteAcp => "WRITE_ACP",
        }
    }

    /// Parse a wire name. Returns `None` for anything unrecognised.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FULL_CONTROL" => Some(Permission::FullControl),
            "READ" => Some(Permission::Read),
            "READ_ACP" => Some(Permission::ReadAcp),
            "WRITE" => Some(Permission::Write),
            "WRITE_ACP" => Some(Permission::WriteAcp),
            _ => None,
        }
    }
}

/// The principal receiving a permission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Grantee {
    /// A canonical user grantee.
    CanonicalUser {
        id: String,
        #[serde(default)]
        display_name: Option<String>,
    },
    /// A predefined group such as AllUsers.
    Group { uri: String },
    /// A grantee addressed by e-mail.
    Email { address: String },
}

impl Grantee {
    /// The anonymous / all-users group.
    pub fn all_users() -> Self {
        Grantee::Group {
            uri: ALL_USERS_URI.to_string(),
        }
    }
}

/// A single (principal, permission) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grant {
    pub grantee: Grantee,
    pub permission: Permission,
}

impl Grant {
    /// Canonical "anyone may read" grant.
    pub fn public_read() -> Self {
        Grant {
            grantee: Grantee::all_users(),
            permission: Permission::Read,
        }
    }

    /// Canonical "anyone may write" grant.
    pub fn public_write() -> Self {
        Grant {
            grantee: Grantee::all_users(),
            permission: Permission::Write,
        }
    }
}

/// Canned ACLs understood by the object store adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedAcl {
    Private,
    PublicRead,
    PublicReadWrite,
}

impl CannedAcl {
    /// Header value, e.g. `public-read-write`.
    pub fn as_str(&self) -> &'static str {
        match self {
            CannedAcl::Private => "private",
            CannedAcl::PublicRead => "public-read",
            CannedAcl::PublicReadWrite => "public-read-write",
        }
    }

    /// Expand into the grant list S3 would store for an object owned by `owner`.
    ///
    /// The owner always holds FULL_CONTROL; public grants follow it.
    pub fn grants(&self, owner: &Grantee) -> Vec<Grant> {
        let mut grants = vec![Grant {
            grantee: owner.clone(),
            permission: Permission::FullControl,
        }];
        match self {
            CannedAcl::Private => {}
            CannedAcl::PublicRead => grants.push(Grant::public_read()),
            CannedAcl::PublicReadWrite => {
                grants.push(Grant::public_read());
                grants.push(Grant::public_write());
            }
        }
        grants
    }
}

/// Whether `grants` contains the canonical public WRITE grant.
pub fn is_public_writable(grants: &[Grant]) -> bool {
    grants.contains(&Grant::public_write())
}

/// Whether `grants` is public-read: READ present, WRITE absent.
pub fn is_public_read_only(grants: &[Grant]) -> bool {
    grants.contains(&Grant::public_read()) && !is_public_writable(grants)
}

//! Object store adapters.
//!
//! The [`store::ObjectStore`] trait abstracts over the backend that holds
//! upload objects and their ACLs. Implementations include an in-memory
//! store and an AWS S3 adapter.

pub mod aws;
pub mod memory;
pub mod store;

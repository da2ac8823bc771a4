//! HTTP handlers for the upload API.

pub mod upload;

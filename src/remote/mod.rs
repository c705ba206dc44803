//! Remote API boundary
//!
//! The remote secrets-management service is treated as a path-addressed
//! key-value store: write, read, delete. [`RemoteApi`] is the seam the
//! lifecycle driver works against; [`VaultClient`] is the production
//! implementation speaking the Vault HTTP conventions.

pub mod client;
pub mod http;

pub use client::{ClientConfig, VaultClient};

use crate::error::Result;
use crate::record::FieldMap;
use std::future::Future;

/// Path-addressed key-value interface to the remote API.
///
/// Implementations must be `Send + Sync` so distinct resource instances can
/// be driven concurrently over one shared client.
pub trait RemoteApi: Send + Sync {
    /// Write a payload at `path`. Some endpoints answer with a body
    /// (e.g. a server-issued identifier), most answer empty.
    fn write(
        &self,
        path: &str,
        payload: &FieldMap,
    ) -> impl Future<Output = Result<Option<FieldMap>>> + Send;

    /// Read the object at `path`. `None` signals not-found.
    fn read(&self, path: &str) -> impl Future<Output = Result<Option<FieldMap>>> + Send;

    /// Delete the object at `path`. Absence of the target is not an error.
    fn delete(&self, path: &str) -> impl Future<Output = Result<()>> + Send;
}

pub mod embedded;
#[cfg(feature = "filesystem")]
pub mod filesystem;
#[cfg(feature = "http")]
pub mod http;
pub mod object_store;

use async_trait::async_trait;
use std::sync::Arc;
use sluice_config::ParsePolicy;

use crate::error::BackendError;
use crate::types::ScriptReader;

/// The storage capability a migration source is built on: one flat listing and
/// per-name fetches.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Location shown in logs and enumeration errors.
    fn describe(&self) -> String;

    /// How names that are not migrations are treated unless the caller overrides it.
    fn default_parse_policy(&self) -> ParsePolicy;

    /// Names of the entries directly under the source location, without
    /// directory components.
    async fn list(&self) -> Result<Vec<String>, BackendError>;

    /// Open the content of a listed entry.
    async fn fetch(&self, raw: &str) -> Result<ScriptReader, BackendError>;

    async fn close(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

#[async_trait]
impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn default_parse_policy(&self) -> ParsePolicy {
        (**self).default_parse_policy()
    }

    async fn list(&self) -> Result<Vec<String>, BackendError> {
        (**self).list().await
    }

    async fn fetch(&self, raw: &str) -> Result<ScriptReader, BackendError> {
        (**self).fetch(raw).await
    }

    async fn close(&self) -> Result<(), BackendError> {
        (**self).close().await
    }
}

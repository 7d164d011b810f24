//! Object storage backend
//!
//! Works against any bucket/key store through [`ObjectStoreClient`]. The client
//! is supplied by the caller already authenticated, so credentials and sessions
//! stay outside this crate, and the caller may keep using the same client.
//!
//! Addresses look like `s3://bucket/some/prefix`: the host is the bucket and the
//! path becomes the key prefix. Buckets often hold unrelated objects next to the
//! migrations, so names that do not parse are skipped by default.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use sluice_config::ParsePolicy;

use crate::address::SourceAddress;
use crate::backends::Backend;
use crate::error::{BackendError, Result};
use crate::types::ScriptReader;

const DELIMITER: &str = "/";

/// Minimal object storage API needed to serve migrations.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Full keys of the objects under `prefix` that have no further
    /// `delimiter` after it.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
    ) -> std::result::Result<Vec<String>, BackendError>;

    async fn get_object(&self, bucket: &str, key: &str) -> std::result::Result<ScriptReader, BackendError>;
}

pub struct ObjectStoreBackend<C: ?Sized> {
    client: Arc<C>,
    bucket: String,
    prefix: String,
}

impl<C: ObjectStoreClient + ?Sized> ObjectStoreBackend<C> {
    /// `prefix` is used as given; pass `""` for the bucket root or a value
    /// ending in `/`.
    pub fn new(client: Arc<C>, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    pub fn from_address(client: Arc<C>, address: &SourceAddress) -> Result<Self> {
        if address.host().is_empty() {
            return Err(address.invalid("object storage address has no bucket"));
        }

        Ok(Self::new(client, address.host(), address.object_prefix()))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

#[async_trait]
impl<C: ObjectStoreClient + ?Sized> Backend for ObjectStoreBackend<C> {
    fn describe(&self) -> String {
        format!("bucket {} prefix '{}'", self.bucket, self.prefix)
    }

    fn default_parse_policy(&self) -> ParsePolicy {
        ParsePolicy::Skip
    }

    async fn list(&self) -> std::result::Result<Vec<String>, BackendError> {
        let keys = self
            .client
            .list_objects(&self.bucket, &self.prefix, DELIMITER)
            .await?;

        let mut names = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(name) = key.strip_prefix(self.prefix.as_str()) else {
                debug!("Ignoring key {} outside prefix '{}'", key, self.prefix);
                continue;
            };

            // The prefix itself (a "folder" marker) and anything nested below it
            if name.is_empty() || name.contains(DELIMITER) {
                continue;
            }

            names.push(name.to_string());
        }

        Ok(names)
    }

    async fn fetch(&self, raw: &str) -> std::result::Result<ScriptReader, BackendError> {
        let key = format!("{}{}", self.prefix, raw);
        self.client.get_object(&self.bucket, &key).await
    }
}

//! In-memory backends for exercising sources without real storage
//!
//! Both keep their content behind a lock so tests can change it after a source
//! has been opened, e.g. to simulate an object deleted between list and fetch.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use sluice_config::ParsePolicy;

use crate::backends::object_store::ObjectStoreClient;
use crate::backends::Backend;
use crate::error::BackendError;
use crate::types::ScriptReader;

/// A [`Backend`] over named in-memory entries.
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
    parse_policy: ParsePolicy,
    fail_listing: AtomicBool,
    fetches: AtomicUsize,
    closes: AtomicUsize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            parse_policy: ParsePolicy::Skip,
            fail_listing: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        }
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let backend = Self::new();
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: RwLock::new(map),
            ..backend
        }
    }

    pub fn with_parse_policy(mut self, policy: ParsePolicy) -> Self {
        self.parse_policy = policy;
        self
    }

    pub async fn put(&self, name: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.entries.write().await.insert(name.into(), content.into());
    }

    pub async fn remove(&self, name: &str) -> bool {
        self.entries.write().await.remove(name).is_some()
    }

    /// Make every following `list` call fail.
    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    /// Number of `fetch` calls so far, successful or not.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn default_parse_policy(&self) -> ParsePolicy {
        self.parse_policy
    }

    async fn list(&self) -> Result<Vec<String>, BackendError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(BackendError::Other("listing unavailable".to_string()));
        }
        Ok(self.entries.read().await.keys().cloned().collect())
    }

    async fn fetch(&self, raw: &str) -> Result<ScriptReader, BackendError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let entries = self.entries.read().await;
        let content = entries
            .get(raw)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(raw.to_string()))?;
        Ok(Box::new(Cursor::new(content)))
    }

    async fn close(&self) -> Result<(), BackendError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// An [`ObjectStoreClient`] over in-memory buckets.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<(String, String), Vec<u8>>>,
    fail_listing: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, bucket: &str, key: &str, content: impl Into<Vec<u8>>) {
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), content.into());
    }

    pub async fn delete(&self, bucket: &str, key: &str) -> bool {
        self.objects
            .write()
            .await
            .remove(&(bucket.to_string(), key.to_string()))
            .is_some()
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStoreClient for MemoryObjectStore {
    async fn list_objects(&self, bucket: &str, prefix: &str, delimiter: &str) -> Result<Vec<String>, BackendError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(BackendError::Status {
                status: 403,
                url: format!("{}/{}", bucket, prefix),
            });
        }

        let objects = self.objects.read().await;
        Ok(objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .filter_map(|(_, key)| {
                let rest = key.strip_prefix(prefix)?;
                // keys past the next delimiter are grouped away, as object stores do
                if !delimiter.is_empty() && rest.contains(delimiter) {
                    return None;
                }
                Some(key.clone())
            })
            .collect())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ScriptReader, BackendError> {
        let objects = self.objects.read().await;
        let content = objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("{}/{}", bucket, key)))?;
        Ok(Box::new(Cursor::new(content)))
    }
}

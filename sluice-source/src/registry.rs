//! Scheme-keyed source construction
//!
//! A [`SourceRegistry`] is an ordinary value owned by the caller. Backends that
//! need injected clients (object storage) or compiled-in data (embedded) are
//! added explicitly with [`SourceRegistry::register`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use sluice_config::{SluiceConfig, SourceConfig};

use crate::address::SourceAddress;
use crate::backends::embedded::EmbeddedBackend;
use crate::backends::object_store::{ObjectStoreBackend, ObjectStoreClient};
use crate::driver::{MigrationSource, SourceDriver, SourceOptions};
use crate::error::{Result, SourceError};

/// Builds a ready source for an address of one scheme.
#[async_trait]
pub trait SourceOpener: Send + Sync {
    async fn open(&self, address: &SourceAddress, options: SourceOptions) -> Result<Box<dyn SourceDriver>>;
}

#[cfg(feature = "filesystem")]
#[derive(Debug, Clone, Default)]
pub struct FilesystemOpener;

#[cfg(feature = "filesystem")]
#[async_trait]
impl SourceOpener for FilesystemOpener {
    async fn open(&self, address: &SourceAddress, options: SourceOptions) -> Result<Box<dyn SourceDriver>> {
        let backend = crate::backends::filesystem::FilesystemBackend::from_address(address)?;
        Ok(Box::new(MigrationSource::open(backend, options).await?))
    }
}

#[cfg(feature = "http")]
#[derive(Debug, Clone, Default)]
pub struct HttpOpener {
    config: sluice_config::HttpConfig,
}

#[cfg(feature = "http")]
impl HttpOpener {
    pub fn new(config: sluice_config::HttpConfig) -> Self {
        Self { config }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl SourceOpener for HttpOpener {
    async fn open(&self, address: &SourceAddress, options: SourceOptions) -> Result<Box<dyn SourceDriver>> {
        let backend = crate::backends::http::HttpBackend::from_address(address, &self.config)?;
        Ok(Box::new(MigrationSource::open(backend, options).await?))
    }
}

/// Serves one fixed embedded set for any address of its scheme.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedOpener {
    backend: EmbeddedBackend,
}

impl EmbeddedOpener {
    pub fn new(backend: EmbeddedBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl SourceOpener for EmbeddedOpener {
    async fn open(&self, _address: &SourceAddress, options: SourceOptions) -> Result<Box<dyn SourceDriver>> {
        Ok(Box::new(MigrationSource::open(self.backend, options).await?))
    }
}

/// Opens bucket/prefix addresses through a shared, caller-authenticated client.
pub struct ObjectStoreOpener<C: ?Sized> {
    client: Arc<C>,
}

impl<C: ObjectStoreClient + ?Sized> ObjectStoreOpener<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: ObjectStoreClient + ?Sized + 'static> SourceOpener for ObjectStoreOpener<C> {
    async fn open(&self, address: &SourceAddress, options: SourceOptions) -> Result<Box<dyn SourceDriver>> {
        let backend = ObjectStoreBackend::from_address(self.client.clone(), address)?;
        Ok(Box::new(MigrationSource::open(backend, options).await?))
    }
}

pub struct SourceRegistry {
    openers: HashMap<String, Arc<dyn SourceOpener>>,
    config: SourceConfig,
}

impl SourceRegistry {
    /// An empty registry.
    pub fn new(config: SourceConfig) -> Self {
        Self {
            openers: HashMap::new(),
            config,
        }
    }

    /// A registry with the backends that need no injected state:
    /// `file`, `http` and `https` (subject to crate features).
    pub fn with_defaults(config: &SluiceConfig) -> Self {
        let mut registry = Self::new(config.source.clone());

        #[cfg(feature = "filesystem")]
        registry.register("file", FilesystemOpener);

        #[cfg(feature = "http")]
        {
            let http = HttpOpener::new(config.http.clone());
            registry.register("http", http.clone());
            registry.register("https", http);
        }

        registry
    }

    /// Add or replace the opener for `scheme`.
    pub fn register(&mut self, scheme: impl Into<String>, opener: impl SourceOpener + 'static) -> &mut Self {
        let scheme = scheme.into().to_ascii_lowercase();
        debug!("Registering source opener for scheme '{}'", scheme);
        self.openers.insert(scheme, Arc::new(opener));
        self
    }

    pub fn supports(&self, scheme: &str) -> bool {
        self.openers.contains_key(&scheme.to_ascii_lowercase())
    }

    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = self.openers.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        schemes
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Open `address` with the registry's configured options.
    pub async fn open(&self, address: &str) -> Result<Box<dyn SourceDriver>> {
        self.open_with(address, SourceOptions::from(&self.config)).await
    }

    /// Open `address`, bounded by the configured open timeout.
    ///
    /// The address is parsed and its scheme resolved before any I/O.
    pub async fn open_with(&self, address: &str, options: SourceOptions) -> Result<Box<dyn SourceDriver>> {
        let address = SourceAddress::parse(address)?;
        let opener = self.openers.get(address.scheme()).ok_or_else(|| {
            address.invalid(format!(
                "no source registered for scheme '{}' (known: {})",
                address.scheme(),
                self.schemes().join(", ")
            ))
        })?;

        info!("Opening migration source {}", address);

        match self.config.open_timeout {
            Some(limit) => tokio::time::timeout(limit, opener.open(&address, options))
                .await
                .map_err(|_| SourceError::Timeout(limit))?,
            None => opener.open(&address, options).await,
        }
    }
}

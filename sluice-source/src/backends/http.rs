//! HTTP migration backend
//!
//! Migrations published under a base URL next to a JSON manifest listing
//! their file names:
//!
//! ```text
//! https://cdn.example.com/db/migrations.json   ["1_init.up.sql", "1_init.down.sql"]
//! https://cdn.example.com/db/1_init.up.sql
//! https://cdn.example.com/db/1_init.down.sql
//! ```
//!
//! The manifest exists only to list migrations, so an entry that does not parse
//! fails construction by default.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::{Client, Response, StatusCode};
use tokio_util::io::StreamReader;
use tracing::debug;
use url::Url;

use sluice_config::{HttpConfig, ParsePolicy};

use crate::address::SourceAddress;
use crate::backends::Backend;
use crate::error::{BackendError, Result, SourceError};
use crate::types::ScriptReader;

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
    manifest: String,
    bearer_token: Option<String>,
}

impl HttpBackend {
    /// Build a backend with its own client configured from `config`.
    pub fn new(base: Url, config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SourceError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let mut backend = Self::with_client(client, base, config.manifest.clone());
        backend.bearer_token = config.bearer_token.clone();
        Ok(backend)
    }

    /// Build a backend around a caller-supplied client.
    pub fn with_client(client: Client, base: Url, manifest: impl Into<String>) -> Self {
        Self {
            client,
            base,
            manifest: manifest.into(),
            bearer_token: None,
        }
    }

    /// Backend for an `http://` or `https://` address.
    pub fn from_address(address: &SourceAddress, config: &HttpConfig) -> Result<Self> {
        if !matches!(address.scheme(), "http" | "https") {
            return Err(address.invalid("HTTP sources use the http:// or https:// scheme"));
        }

        let url = address
            .url()
            .cloned()
            .ok_or_else(|| address.invalid("not a URL"))?;

        if address.host().is_empty() {
            return Err(address.invalid("HTTP address has no host"));
        }

        Self::new(url, config)
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn entry_url(&self, name: &str) -> std::result::Result<Url, BackendError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::Other(format!("{} cannot be used as a base URL", self.base)))?
            .pop_if_empty()
            .push(name);
        Ok(url)
    }

    async fn get(&self, url: Url) -> std::result::Result<Response, BackendError> {
        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(BackendError::NotFound(url.to_string())),
            status => Err(BackendError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }),
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    /// The base URL without query, fragment or password, which may carry credentials.
    fn describe(&self) -> String {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        let _ = url.set_password(None);
        url.to_string()
    }

    fn default_parse_policy(&self) -> ParsePolicy {
        ParsePolicy::Reject
    }

    async fn list(&self) -> std::result::Result<Vec<String>, BackendError> {
        let url = self.entry_url(&self.manifest)?;
        let body = self.get(url.clone()).await?.bytes().await?;

        let entries: Vec<String> = serde_json::from_slice(&body).map_err(|e| {
            BackendError::Other(format!("{} is not a JSON array of file names: {}", url, e))
        })?;

        Ok(entries
            .into_iter()
            .filter(|name| {
                let flat = !name.contains('/');
                if !flat {
                    debug!("Ignoring nested manifest entry {}", name);
                }
                flat
            })
            .collect())
    }

    async fn fetch(&self, raw: &str) -> std::result::Result<ScriptReader, BackendError> {
        let url = self.entry_url(raw)?;
        let response = self.get(url).await?;
        let body = response.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::new(StreamReader::new(Box::pin(body))))
    }
}

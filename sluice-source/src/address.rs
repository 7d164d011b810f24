//! Location addressing: `scheme://host/path` strings naming a migration source

use std::fmt;

use url::Url;

use crate::error::{Result, SourceError};

/// A parsed source location such as `file://migrations`,
/// `https://cdn.example.com/db/migrations` or `s3://bucket/prefix`.
///
/// Parsing only checks shape; each backend applies its own requirements
/// (a path for `file`, a bucket for `s3`) before doing any I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAddress {
    raw: String,
    scheme: String,
    host: String,
    path: String,
    url: Option<Url>,
}

impl SourceAddress {
    pub fn parse(raw: &str) -> Result<Self> {
        let (scheme, rest) = raw
            .split_once("://")
            .ok_or_else(|| SourceError::address(raw, "expected scheme://location"))?;

        if scheme.is_empty() {
            return Err(SourceError::address(raw, "scheme is empty"));
        }

        if !scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        {
            return Err(SourceError::address(raw, format!("invalid scheme '{}'", scheme)));
        }

        let scheme = scheme.to_ascii_lowercase();

        // Keep file paths literal: URL parsing would turn `file://./migrations`
        // into host "." and `file://migrations` into host "migrations".
        if scheme == "file" {
            return Ok(Self {
                raw: raw.to_string(),
                scheme,
                host: String::new(),
                path: rest.to_string(),
                url: None,
            });
        }

        let url = Url::parse(raw).map_err(|e| SourceError::address(raw, e.to_string()))?;

        Ok(Self {
            raw: raw.to_string(),
            scheme,
            host: url.host_str().unwrap_or_default().to_string(),
            path: url.path().to_string(),
            url: Some(url),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Authority part: the bucket for object storage, the server for http.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Object key prefix for the path: empty at the bucket root, otherwise the
    /// path without surrounding slashes plus a single trailing `/`.
    pub fn object_prefix(&self) -> String {
        let trimmed = self.path.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("{}/", trimmed)
        }
    }

    pub(crate) fn invalid(&self, reason: impl Into<String>) -> SourceError {
        SourceError::address(&self.raw, reason)
    }
}

impl fmt::Display for SourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

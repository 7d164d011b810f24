use std::time::Duration;

use thiserror::Error;

use crate::types::{Direction, Version};

/// Failure raised by a storage backend while listing or fetching.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Invalid source address '{address}': {reason}")]
    Address { address: String, reason: String },

    #[error("Failed to list migrations at {location}: {source}")]
    Enumeration {
        location: String,
        #[source]
        source: BackendError,
    },

    #[error("Invalid migration file name '{raw}': {reason}")]
    Parse { raw: String, reason: String },

    #[error("Duplicate {direction} migration for version {version}: '{duplicate}' conflicts with '{existing}'")]
    DuplicateVersion {
        version: Version,
        direction: Direction,
        existing: String,
        duplicate: String,
    },

    #[error("No migration found for version {version}{}", direction_suffix(.direction))]
    NotFound {
        version: Version,
        direction: Option<Direction>,
    },

    #[error("No migrations found")]
    Empty,

    #[error("Failed to read migration '{raw}': {source}")]
    Fetch {
        raw: String,
        #[source]
        source: BackendError,
    },

    #[error("Source is closed")]
    Closed,

    #[error("Failed to close {location}: {source}")]
    Close {
        location: String,
        #[source]
        source: BackendError,
    },

    #[error("Opening source timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SourceError {
    /// True when the error means "no such version" rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound { .. } | SourceError::Empty)
    }

    pub(crate) fn address(address: &str, reason: impl Into<String>) -> Self {
        SourceError::Address {
            address: address.to_string(),
            reason: reason.into(),
        }
    }
}

fn direction_suffix(direction: &Option<Direction>) -> String {
    direction.map(|d| format!(" ({})", d)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, SourceError>;

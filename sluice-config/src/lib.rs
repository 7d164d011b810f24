//! Domain-driven configuration for sluice
//!
//! Configuration is split by functional domain (source, http, logging), each
//! with its own defaults and validation, and can be loaded from YAML with
//! `SLUICE_*` environment overrides.

pub mod error;
pub mod loader;
pub mod validation;

pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

pub use domains::{
    http::HttpConfig,
    logging::{LogFormat, LogLevel, LoggingConfig},
    source::{ParsePolicy, SourceConfig},
    SluiceConfig,
};

pub use domains::utils::serde_duration;

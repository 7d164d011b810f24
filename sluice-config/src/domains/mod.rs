//! Domain-specific configuration modules

pub mod http;
pub mod logging;
pub mod source;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main sluice configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SluiceConfig {
    /// Migration source behaviour (parse policy, open timeout)
    #[serde(default)]
    pub source: source::SourceConfig,

    /// HTTP backend configuration
    #[serde(default)]
    pub http: http::HttpConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl SluiceConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.source.validate()?;
        self.http.validate()?;
        self.logging.validate()?;

        if let Some(open_timeout) = self.source.open_timeout {
            if self.http.timeout > open_timeout {
                log::warn!(
                    "http.timeout ({}s) exceeds source.open_timeout ({}s); listing will be cut off by the open timeout",
                    self.http.timeout.as_secs(),
                    open_timeout.as_secs()
                );
            }
        }

        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = SluiceConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}

//! Migration source configuration

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// What to do with a listed name that does not follow the migration naming
/// convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsePolicy {
    /// Leave the entry out of the index and keep going.
    Skip,
    /// Fail construction, naming the entry.
    Reject,
}

/// Source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Overrides the backend's default parse policy when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_policy: Option<ParsePolicy>,

    /// Upper bound for listing and index construction; unbounded when absent
    #[serde(
        with = "crate::domains::utils::serde_duration_option",
        default = "default_open_timeout"
    )]
    pub open_timeout: Option<Duration>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            parse_policy: None,
            open_timeout: default_open_timeout(),
        }
    }
}

impl ParsePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParsePolicy::Skip => "skip",
            ParsePolicy::Reject => "reject",
        }
    }
}

impl fmt::Display for ParsePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParsePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" | "permissive" => Ok(ParsePolicy::Skip),
            "reject" | "strict" => Ok(ParsePolicy::Reject),
            _ => Err(format!("Invalid parse policy: {}", s)),
        }
    }
}

impl Validatable for SourceConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(timeout) = self.open_timeout {
            if timeout.is_zero() {
                return Err(self.validation_error(
                    "open_timeout must be greater than 0 (set it to null to disable the bound)",
                ));
            }
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "source"
    }
}

fn default_open_timeout() -> Option<Duration> {
    Some(Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policy_from_str() {
        assert_eq!(ParsePolicy::from_str("skip").unwrap(), ParsePolicy::Skip);
        assert_eq!(ParsePolicy::from_str("permissive").unwrap(), ParsePolicy::Skip);
        assert_eq!(ParsePolicy::from_str("STRICT").unwrap(), ParsePolicy::Reject);
        assert_eq!(ParsePolicy::from_str("reject").unwrap(), ParsePolicy::Reject);
        assert!(ParsePolicy::from_str("lenient").is_err());
    }

    #[test]
    fn test_source_config_defaults() {
        let config = SourceConfig::default();
        assert_eq!(config.parse_policy, None);
        assert_eq!(config.open_timeout, Some(Duration::from_secs(60)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_open_timeout_is_invalid() {
        let config = SourceConfig {
            parse_policy: None,
            open_timeout: Some(Duration::ZERO),
        };
        assert!(config.validate().is_err());

        let unbounded = SourceConfig {
            parse_policy: Some(ParsePolicy::Reject),
            open_timeout: None,
        };
        assert!(unbounded.validate().is_ok());
    }
}

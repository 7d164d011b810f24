//! Migration file naming convention
//!
//! Names follow `{version}_{identifier}.{up|down}.{extension}`, for example
//! `20240101120000_create_users.up.sql`. The identifier may be empty and the
//! extension may itself contain dots (`1_seed.up.sql.gz`).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SourceError};
use crate::types::{Direction, Migration, Version};

static MIGRATION_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]+)_(.*)\.(down|up)\.(.*)$").expect("migration name pattern is valid")
});

/// Parse a backend-relative file name into a [`Migration`].
pub fn parse(raw: &str) -> Result<Migration> {
    let captures = MIGRATION_NAME.captures(raw).ok_or_else(|| SourceError::Parse {
        raw: raw.to_string(),
        reason: "expected {version}_{identifier}.{up|down}.{extension}".to_string(),
    })?;

    let version: Version = captures[1].parse().map_err(|e| SourceError::Parse {
        raw: raw.to_string(),
        reason: format!("version is not a valid unsigned integer: {}", e),
    })?;

    let direction = match &captures[3] {
        "up" => Direction::Up,
        _ => Direction::Down,
    };

    Ok(Migration {
        version,
        identifier: captures[2].to_string(),
        direction,
        raw: raw.to_string(),
    })
}

//! Tracing subscriber setup

use anyhow::Result;
use sluice_config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Build the filter from, in order: the command line level, `RUST_LOG`, the
/// configured level.
fn env_filter(config: &LoggingConfig, log_level: Option<&str>) -> EnvFilter {
    if let Some(level) = log_level {
        return EnvFilter::try_new(level).unwrap_or_else(|_| {
            eprintln!("Invalid log level '{}', falling back to '{}'", level, config.level);
            EnvFilter::new(config.level.as_str())
        });
    }

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()))
}

/// Initialize logging from configuration.
///
/// Output goes to stderr so command output on stdout stays clean.
pub fn init_logging(config: &LoggingConfig, log_level: Option<&str>) -> Result<()> {
    let filter = env_filter(config, log_level);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    // Use try_init to avoid panic if global subscriber already set
    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Text => builder.try_init(),
    };

    if result.is_err() {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

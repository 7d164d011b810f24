//! Command handlers

use anyhow::{Context, Result};
use sluice_config::{ConfigLoader, SluiceConfig};
use sluice_source::{Direction, SourceDriver, Version};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// One line per version: the version, then the up and down names (`-` if absent).
pub async fn list(source: &dyn SourceDriver, out: &mut impl Write) -> Result<()> {
    let migrations = source.migrations();
    for version in migrations.versions() {
        let up = migrations.up(version).map_or("-", |m| m.raw.as_str());
        let down = migrations.down(version).map_or("-", |m| m.raw.as_str());
        writeln!(out, "{}\t{}\t{}", version, up, down)?;
    }

    info!("Listed {} versions", migrations.len());
    Ok(())
}

/// Walk the source with `first`/`next` (or from the last version with `prev`)
/// and print each version visited.
pub async fn walk(source: &dyn SourceDriver, reverse: bool, out: &mut impl Write) -> Result<()> {
    let start = if reverse {
        source.migrations().last()
    } else {
        match source.first().await {
            Ok(version) => Some(version),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e).context("Failed to read first version"),
        }
    };

    let Some(mut current) = start else {
        debug!("Source is empty, nothing to walk");
        return Ok(());
    };

    loop {
        writeln!(out, "{}", current)?;

        let step = if reverse {
            source.prev(current).await
        } else {
            source.next(current).await
        };

        match step {
            Ok(version) => current = version,
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(e).context(format!("Failed to step from version {}", current)),
        }
    }
}

/// Copy one script body to `out`.
pub async fn show(
    source: &dyn SourceDriver,
    version: Version,
    direction: Direction,
    out: &mut impl Write,
) -> Result<()> {
    let read = match direction {
        Direction::Up => source.read_up(version).await,
        Direction::Down => source.read_down(version).await,
    };
    let script = match read {
        Ok(script) => script,
        Err(e) if e.is_not_found() => {
            return Err(e).context(format!("No {} migration for version {}", direction, version))
        }
        Err(e) => {
            return Err(e).context(format!("Failed to read {} migration for version {}", direction, version))
        }
    };

    info!("Reading {}", script.raw);
    let body = script
        .read_to_end()
        .await
        .context("Failed to read migration content")?;
    out.write_all(&body)?;
    Ok(())
}

/// Handle configuration validation
pub fn config_validate(config_file: &Path, out: &mut impl Write) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    if !config_file.exists() {
        return Err(anyhow::anyhow!(
            "Configuration file not found: {:?}",
            config_file
        ));
    }

    ConfigLoader::new()
        .from_file(config_file)
        .with_context(|| format!("Configuration validation failed for {:?}", config_file))?;

    writeln!(out, "Configuration file is valid")?;
    Ok(())
}

/// Handle configuration generation
pub fn config_generate(output: &Path, force: bool) -> Result<()> {
    info!("Generating configuration at: {:?}", output);

    if output.exists() && !force {
        return Err(anyhow::anyhow!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        ));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }

    fs::write(output, SluiceConfig::generate_sample())
        .with_context(|| format!("Failed to write configuration to {:?}", output))?;
    Ok(())
}

/// Handle configuration display
pub fn config_show(config: &SluiceConfig, format: &str, out: &mut impl Write) -> Result<()> {
    let rendered = match format.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::to_string(config).context("Failed to serialize to YAML")?,
        "json" => serde_json::to_string_pretty(config).context("Failed to serialize to JSON")?,
        _ => {
            return Err(anyhow::anyhow!(
                "Unknown output format: {}. Valid formats: yaml, json",
                format
            ))
        }
    };

    writeln!(out, "{}", rendered.trim_end())?;
    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use sluice_config::{ConfigLoader, SluiceConfig};
use sluice_source::{Direction, SourceDriver, SourceRegistry};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, warn};

mod cli;
mod commands;
mod logging;

use cli::{Cli, Commands, ConfigCommands};

/// Load configuration from file or use defaults
fn load_config(config_path: Option<&PathBuf>) -> Result<SluiceConfig> {
    let path = config_path.filter(|path| {
        if !path.exists() {
            eprintln!("Configuration file not found: {:?}. Using defaults.", path);
        }
        path.exists()
    });

    ConfigLoader::new()
        .load(path.map(PathBuf::as_path))
        .context(match path {
            Some(path) => format!("Failed to load configuration from {:?}", path),
            None => "Failed to load configuration from environment".to_string(),
        })
}

async fn open_source(registry: &SourceRegistry, address: &str) -> Result<Box<dyn SourceDriver>> {
    registry
        .open(address)
        .await
        .with_context(|| format!("Failed to open migration source {}", address))
}

/// Close the source, keeping the command's own result.
async fn finish(source: Box<dyn SourceDriver>, address: &str, result: Result<()>) -> Result<()> {
    if let Err(e) = source.close().await {
        warn!("Failed to close source {}: {}", address, e);
    }
    result
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_ref())?;
    if let Some(policy) = cli.parse_policy() {
        config.source.parse_policy = Some(policy);
    }

    logging::init_logging(&config.logging, cli.log_level.as_deref())?;
    debug!("Sluice CLI starting");

    let registry = SourceRegistry::with_defaults(&config);
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Some(Commands::List { address }) => {
            let source = open_source(&registry, &address).await?;
            let result = commands::list(source.as_ref(), &mut stdout).await;
            finish(source, &address, result).await
        }
        Some(Commands::Walk { address, reverse }) => {
            let source = open_source(&registry, &address).await?;
            let result = commands::walk(source.as_ref(), reverse, &mut stdout).await;
            finish(source, &address, result).await
        }
        Some(Commands::Show {
            address,
            version,
            down,
        }) => {
            let direction = if down { Direction::Down } else { Direction::Up };
            let source = open_source(&registry, &address).await?;
            let result = commands::show(source.as_ref(), version, direction, &mut stdout).await;
            finish(source, &address, result).await?;
            stdout.flush()?;
            Ok(())
        }
        Some(Commands::Config { config_cmd }) => match config_cmd {
            ConfigCommands::Validate { config_file } => commands::config_validate(&config_file, &mut stdout),
            ConfigCommands::Generate { output, force } => {
                commands::config_generate(&output, force)?;
                info!("Configuration written to {:?}", output);
                Ok(())
            }
            ConfigCommands::Show { format } => commands::config_show(&config, &format, &mut stdout),
        },
        None => {
            // If no subcommand is provided, print help
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().context("Failed to print help")?;
            println!();
            Ok(())
        }
    }
}

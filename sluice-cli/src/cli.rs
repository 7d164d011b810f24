//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use sluice_config::ParsePolicy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Fail when a listed name is not a migration
    #[arg(long, global = true, conflicts_with = "permissive")]
    pub strict: bool,

    /// Ignore listed names that are not migrations
    #[arg(long, global = true)]
    pub permissive: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Parse policy requested on the command line, if any.
    pub fn parse_policy(&self) -> Option<ParsePolicy> {
        match (self.strict, self.permissive) {
            (true, _) => Some(ParsePolicy::Reject),
            (_, true) => Some(ParsePolicy::Skip),
            _ => None,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every version with its up/down migrations
    List {
        /// Source address (e.g. file://./migrations, https://host/db)
        #[arg(value_name = "ADDRESS")]
        address: String,
    },

    /// Print versions in the order a migration engine would visit them
    Walk {
        /// Source address
        #[arg(value_name = "ADDRESS")]
        address: String,

        /// Start at the last version and walk down
        #[arg(long)]
        reverse: bool,
    },

    /// Print the body of one migration script
    Show {
        /// Source address
        #[arg(value_name = "ADDRESS")]
        address: String,

        /// Migration version
        #[arg(value_name = "VERSION")]
        version: u64,

        /// Show the down migration instead of the up migration
        #[arg(long)]
        down: bool,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Write the default configuration as a YAML sample
    Generate {
        /// Output file path
        #[arg(value_name = "PATH")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the configuration in effect
    Show {
        /// Output format: yaml, json
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}

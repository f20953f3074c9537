//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// slidepack - slide template and offline presentation bundler
#[derive(Parser)]
#[command(
    name = "sp",
    about = "Render slides from a template and bundle exported slides into one offline HTML file",
    version = env!("GIT_DESCRIBE"),
    after_help = after_help(),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Bundle exported slide files into offline presentations
    Bundle {
        /// File names (looked up in the source dir) or glob patterns
        #[arg(required = true, value_name = "NAME|GLOB")]
        inputs: Vec<String>,

        /// Use cached resources only, never touch the network
        #[arg(long)]
        offline: bool,

        /// Leave the slide theme stylesheet out
        #[arg(long)]
        no_theme: bool,

        /// Output file (single input only)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a YAML deck through the slide template, one file per slide
    Render {
        /// Deck file
        deck: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "slides")]
        output: PathBuf,
    },

    /// Check the effective slide template and theme
    CheckTemplate,

    /// Inspect or clear the asset cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

/// Asset cache subcommands
#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Show cache statistics
    Stats {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Remove every cached asset
    Clear,
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("slidepack")
        .join("logs")
        .join("slidepack.log");
    debug!(?path, "get_log_path: returning path");
    path
}

fn after_help() -> String {
    format!("Logs are written to: {}", get_log_path().display())
}

/// Output format for the stats command
#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use text or json", s)),
        }
    }
}

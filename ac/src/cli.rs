//! CLI argument parsing for assetcache

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ac")]
#[command(author, version, about = "Inspect and maintain the web asset cache", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Cache directory (overrides config)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List cached URLs
    List,

    /// Show cache statistics
    Stats,

    /// Print a cached asset (text) or its location (binary)
    Show {
        /// URL of the asset
        #[arg(required = true)]
        url: String,
    },

    /// Remove one cached URL
    Remove {
        /// URL of the asset
        #[arg(required = true)]
        url: String,
    },

    /// Remove entries older than the given number of days
    Prune {
        /// Maximum age in days
        #[arg(short, long, default_value = "30")]
        days: u64,
    },

    /// Delete every cached asset
    Clear,
}

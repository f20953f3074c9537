use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use std::time::Duration;

use assetcache::AssetCache;
use assetcache::cli::{Cli, Command};
use assetcache::config::Config;

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let cache_dir = cli.dir.unwrap_or(config.cache_dir);

    info!("assetcache starting ({})", cache_dir.display());
    let cache = AssetCache::open(&cache_dir)?;

    match cli.command {
        Command::List => {
            let entries = cache.entries()?;
            if entries.is_empty() {
                println!("No cached assets");
            } else {
                for entry in entries {
                    println!(
                        "{:<5} {:>9} {} {}",
                        entry.kind.to_string().yellow(),
                        entry.size,
                        entry.cached_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                        entry.url
                    );
                }
            }
        }
        Command::Stats => {
            let stats = cache.stats()?;
            println!("Cache: {}", cache_dir.display().to_string().cyan());
            println!("  Entries: {}", stats.entry_count);
            println!("  Total bytes: {}", stats.total_bytes);
            for (kind, count) in stats.by_kind {
                println!("  {}: {}", kind, count);
            }
        }
        Command::Show { url } => match cache.get(&url)? {
            Some(asset) if asset.kind.is_text() => {
                println!("{}", String::from_utf8_lossy(&asset.bytes));
            }
            Some(asset) => {
                println!("{} ({} bytes) at {}", asset.kind, asset.bytes.len(), asset.path.display());
            }
            None => {
                eprintln!("{} Not cached: {}", "✗".red(), url);
                std::process::exit(1);
            }
        },
        Command::Remove { url } => {
            if cache.remove(&url)? {
                println!("{} Removed: {}", "✓".green(), url);
            } else {
                println!("Not cached: {}", url);
            }
        }
        Command::Prune { days } => {
            let secs = days
                .checked_mul(24 * 60 * 60)
                .ok_or_else(|| eyre!("--days {} is out of range", days))?;
            let pruned = cache.prune(Duration::from_secs(secs))?;
            println!("{} Pruned {} entries older than {} days", "✓".green(), pruned, days);
        }
        Command::Clear => {
            let removed = cache.clear()?;
            println!("{} Cleared {} cached assets", "✓".green(), removed);
        }
    }

    Ok(())
}

//! slidepack - slide template and offline presentation bundler
//!
//! CLI entry point.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info, warn};

use assetcache::AssetCache;
use slidepack::bundle::{ConversionReport, Converter, expand_inputs, resolve_paths};
use slidepack::cli::{CacheCommand, Cli, Command, OutputFormat, get_log_path};
use slidepack::config::Config;
use slidepack::template::{Deck, SCOPE_CLASS, SlideToken, TemplateLoader, check_template, render_deck, scope_violations};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Bundle {
            inputs,
            offline,
            no_theme,
            output,
        } => cmd_bundle(config, &inputs, offline, no_theme, output).await,
        Command::Render { deck, output } => cmd_render(&config, &deck, &output),
        Command::CheckTemplate => cmd_check_template(&config),
        Command::Cache { command } => cmd_cache(&config, command),
    }
}

async fn cmd_bundle(
    mut config: Config,
    patterns: &[String],
    offline: bool,
    no_theme: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    debug!(?patterns, offline, no_theme, ?output, "cmd_bundle: called");
    config.fetch.offline |= offline;

    let inputs = expand_inputs(&config.paths, patterns)?;
    if output.is_some() && inputs.len() > 1 {
        return Err(eyre!("--output needs exactly one input, got {}", inputs.len()));
    }

    let embed_theme = config.presentation.embed_theme && !no_theme;
    let paths = config.paths.clone();
    let converter = Converter::from_config(config)?.with_theme(embed_theme);

    let mut failures = 0;
    for input in &inputs {
        let target = match &output {
            Some(path) => path.clone(),
            None => resolve_paths(&paths, &input.to_string_lossy()).1,
        };
        println!("Bundling {} ...", input.display());
        match converter.convert(input, &target).await {
            Ok(report) => print_report(&report),
            Err(e) => {
                warn!(?input, error = %e, "Conversion failed");
                println!("{} {}: {:#}", "✗".red(), input.display(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(eyre!("{} of {} conversions failed", failures, inputs.len()));
    }
    Ok(())
}

fn print_report(report: &ConversionReport) {
    println!("{} {}", "✓".green(), report.output.display().to_string().bold());
    println!("  Title: {}", report.title);
    println!("  Slides: {}", report.slides);
    println!("  Size: {:.2} MB", report.output_mb());
    println!(
        "  Resources: {} downloaded, {} from cache",
        report.downloaded, report.cached
    );
    if report.code_blocks > 0 || report.charts > 0 {
        println!("  Code blocks: {}, charts: {}", report.code_blocks, report.charts);
    }
    for (url, reason) in &report.failed {
        println!("  {} {} ({})", "!".yellow(), url, reason);
    }
}

fn cmd_render(config: &Config, deck_path: &Path, out_dir: &Path) -> Result<()> {
    debug!(?deck_path, ?out_dir, "cmd_render: called");
    let loader = TemplateLoader::new(".", &config.paths.template_dir);
    let deck = Deck::load(deck_path)?;
    let written = render_deck(&loader, &deck, out_dir)?;

    for path in &written {
        println!("{} {}", "✓".green(), path.display());
    }
    println!("Rendered {} slides into {}", written.len(), out_dir.display());
    Ok(())
}

fn cmd_check_template(config: &Config) -> Result<()> {
    debug!("cmd_check_template: called");
    let loader = TemplateLoader::new(".", &config.paths.template_dir);
    let mut problems = 0;

    let template = loader.load_template("slide")?;
    println!("Template: {}", loader.source_of("slide").cyan());
    match check_template(&template) {
        Ok(scan) => {
            for token in SlideToken::ALL {
                println!("  {} {:<15} x{}", "✓".green(), token.name(), scan.count(token));
            }
        }
        Err(e) => {
            println!("  {} {}", "✗".red(), e);
            problems += 1;
        }
    }

    let theme = loader.theme_css()?;
    println!("Theme: {}", loader.source_of("theme").cyan());
    let violations = scope_violations(&theme, SCOPE_CLASS);
    if violations.is_empty() {
        println!("  {} every selector is scoped under {}", "✓".green(), SCOPE_CLASS);
    } else {
        for selector in &violations {
            println!("  {} unscoped selector: {}", "✗".red(), selector);
        }
        problems += violations.len();
    }

    if problems > 0 {
        return Err(eyre!("Template check found {} problem(s)", problems));
    }
    Ok(())
}

fn cmd_cache(config: &Config, command: CacheCommand) -> Result<()> {
    debug!(?command, "cmd_cache: called");
    let cache_dir = &config.paths.cache_dir;
    let cache = AssetCache::open(cache_dir).context(format!("Failed to open cache {}", cache_dir.display()))?;

    match command {
        CacheCommand::Stats { format } => {
            let stats = cache.stats()?;
            match format {
                OutputFormat::Json => {
                    let by_kind: serde_json::Map<String, serde_json::Value> = stats
                        .by_kind
                        .iter()
                        .map(|(kind, count)| (kind.to_string(), serde_json::json!(count)))
                        .collect();
                    let json = serde_json::json!({
                        "dir": cache_dir.display().to_string(),
                        "entries": stats.entry_count,
                        "total_bytes": stats.total_bytes,
                        "by_kind": by_kind,
                    });
                    println!("{}", serde_json::to_string_pretty(&json)?);
                }
                OutputFormat::Text => {
                    println!("Cache: {}", cache_dir.display().to_string().cyan());
                    println!("  Entries: {}", stats.entry_count);
                    println!("  Total bytes: {}", stats.total_bytes);
                    for (kind, count) in &stats.by_kind {
                        println!("  {}: {}", kind, count);
                    }
                }
            }
        }
        CacheCommand::Clear => {
            let removed = cache.clear()?;
            println!("{} Cleared {} cached assets", "✓".green(), removed);
        }
    }
    Ok(())
}

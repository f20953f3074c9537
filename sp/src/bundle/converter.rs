//! Converter - exported slide file to a single offline presentation

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetcache::AssetCache;
use eyre::{Context, Result};
use tracing::{debug, info};

use super::assemble::{AssembleOptions, assemble};
use super::slide::Slide;
use super::split::{deck_title, split_slides};
use super::BundleError;
use crate::config::{Config, PathsConfig};
use crate::fetch::{CdnFilter, Downloader, Fetcher, HttpFetcher, OfflineFetcher};
use crate::template::TemplateLoader;

/// Summary of one conversion
#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub title: String,
    pub slides: usize,
    pub code_blocks: usize,
    pub charts: usize,
    /// Stylesheets, scripts and imports replaced by inline copies
    pub inlined: usize,
    pub output_bytes: u64,
    pub cached: usize,
    pub downloaded: usize,
    /// URL and reason for every resource left as an external reference
    pub failed: Vec<(String, String)>,
}

impl ConversionReport {
    pub fn output_mb(&self) -> f64 {
        self.output_bytes as f64 / 1024.0 / 1024.0
    }
}

/// Input and output paths for a slide file name
///
/// An existing file is used as-is. Otherwise `name` (with `.html` appended
/// when missing) is looked up in the source directory. The output is
/// `<output-dir>/<stem>_ppt.html`.
pub fn resolve_paths(paths: &PathsConfig, name: &str) -> (PathBuf, PathBuf) {
    let given = Path::new(name);
    let input = if given.is_file() {
        given.to_path_buf()
    } else if name.to_lowercase().ends_with(".html") {
        paths.source_dir.join(name)
    } else {
        paths.source_dir.join(format!("{}.html", name))
    };

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let output = paths.output_dir.join(format!("{}_ppt.html", stem));

    debug!(%name, ?input, ?output, "resolve_paths: resolved");
    (input, output)
}

/// Expand names and glob patterns into input files
///
/// Patterns are tried as given, then under the source directory. Plain names
/// go through [`resolve_paths`] and are checked when converted.
pub fn expand_inputs(paths: &PathsConfig, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for pattern in patterns {
        if !pattern.contains(['*', '?', '[']) {
            inputs.push(resolve_paths(paths, pattern).0);
            continue;
        }

        let under_source = paths.source_dir.join(pattern).to_string_lossy().into_owned();
        let mut matched = Vec::new();
        for candidate in [pattern.as_str(), under_source.as_str()] {
            for entry in glob::glob(candidate).context(format!("Invalid glob pattern: {}", pattern))? {
                let path = entry?;
                if path.is_file() {
                    matched.push(path);
                }
            }
            if !matched.is_empty() {
                break;
            }
        }

        if matched.is_empty() {
            return Err(BundleError::NoMatch(pattern.clone()).into());
        }
        matched.sort();
        inputs.extend(matched);
    }
    Ok(inputs)
}

/// Converts exported multi-slide HTML files into offline presentations
pub struct Converter {
    config: Config,
    loader: TemplateLoader,
    downloader: Downloader,
    embed_theme: bool,
}

impl Converter {
    pub fn new(config: Config, loader: TemplateLoader, fetcher: Arc<dyn Fetcher>, cache: Arc<AssetCache>) -> Result<Self> {
        let filter = CdnFilter::new(&config.cdn)?;
        let downloader = Downloader::new(fetcher, cache, filter, config.fetch.max_concurrent);
        let embed_theme = config.presentation.embed_theme;
        Ok(Self {
            config,
            loader,
            downloader,
            embed_theme,
        })
    }

    /// Build a converter from configuration: template overrides in the
    /// working directory, cache under `paths.cache-dir`, network unless offline
    pub fn from_config(config: Config) -> Result<Self> {
        debug!(offline = config.fetch.offline, "Converter::from_config: called");
        let loader = TemplateLoader::new(".", &config.paths.template_dir);
        let cache = Arc::new(AssetCache::open(&config.paths.cache_dir)?);
        let fetcher: Arc<dyn Fetcher> = if config.fetch.offline {
            Arc::new(OfflineFetcher)
        } else {
            Arc::new(HttpFetcher::from_config(&config.fetch)?)
        };
        Self::new(config, loader, fetcher, cache)
    }

    /// Include or leave out the slide theme stylesheet
    pub fn with_theme(mut self, embed_theme: bool) -> Self {
        self.embed_theme = embed_theme;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Convert one file
    ///
    /// Resources of all slides plus the essentials are downloaded once, up
    /// front. A resource that cannot be loaded keeps its original reference.
    pub async fn convert(&self, input: &Path, output: &Path) -> Result<ConversionReport> {
        debug!(?input, ?output, "Converter::convert: called");
        if !input.is_file() {
            return Err(BundleError::InputNotFound(input.to_path_buf()).into());
        }

        let content = tokio::fs::read_to_string(input)
            .await
            .context(format!("Failed to read {}", input.display()))?;

        let slides: Vec<Slide> = split_slides(&content)?
            .iter()
            .enumerate()
            .map(|(i, html)| Slide::parse(html, i))
            .collect();
        info!(count = slides.len(), ?input, "Split slides");

        let title = slides
            .first()
            .and_then(|s| deck_title(&s.root))
            .unwrap_or_else(|| self.config.presentation.default_title.clone());
        info!(%title, "Presentation title");

        let mut urls: Vec<String> = slides
            .iter()
            .flat_map(|s| s.cdn_urls(self.downloader.filter()))
            .collect();
        urls.extend(self.config.essentials.urls());
        let resources = self.downloader.fetch_all(urls).await;

        let mut report = ConversionReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            title: title.clone(),
            slides: slides.len(),
            cached: resources.cached,
            downloaded: resources.downloaded,
            failed: resources.failed.clone(),
            ..Default::default()
        };

        let mut rendered = Vec::with_capacity(slides.len());
        for slide in slides {
            let index = slide.index;
            let processed = slide
                .finish(&self.loader, &resources)
                .context(format!("Failed to process slide {}", index + 1))?;
            report.code_blocks += processed.code_blocks;
            report.charts += processed.charts;
            report.inlined += processed.inlined;
            rendered.push(processed.html);
        }

        let options = AssembleOptions {
            title,
            lang: self.config.presentation.lang.clone(),
            embed_theme: self.embed_theme,
        };
        let html = assemble(&self.loader, &rendered, &resources, &self.config.essentials, &options)?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .context(format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(output, &html)
            .await
            .context(format!("Failed to write {}", output.display()))?;
        report.output_bytes = html.len() as u64;

        info!(
            slides = report.slides,
            bytes = report.output_bytes,
            failed = report.failed.len(),
            ?output,
            "Conversion complete"
        );
        Ok(report)
    }
}

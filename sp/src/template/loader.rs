//! Template Loader
//!
//! Loads templates from files or falls back to embedded defaults, and renders
//! them with Handlebars.

use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::{SlideFields, TemplateError, embedded};

/// Context for the offline presentation document
#[derive(Debug, Clone, Default, Serialize)]
pub struct PresenterContext {
    /// Document title (escaped on render)
    pub title: String,
    pub lang: String,
    pub version: String,
    pub fontawesome_css: Option<String>,
    pub highlight_css: Option<String>,
    pub highlight_js: Option<String>,
    pub theme_css: Option<String>,
    pub presenter_css: String,
    pub manager_js: String,
    /// Already-serialised slide markup
    pub slides: String,
    pub slide_count: usize,
}

/// Context for wrapping one slide's chart script
#[derive(Debug, Clone, Serialize)]
pub struct ChartContext {
    pub slide_id: String,
    pub body: String,
}

/// Loads and renders slide, presenter and chart templates
pub struct TemplateLoader {
    /// Plain substitution: the slide token contract defines no escaping
    raw: Handlebars<'static>,
    /// HTML-escaping engine for the presenter document
    html: Handlebars<'static>,
    /// User override directory (e.g., `.slidepack/templates/`)
    user_dir: Option<PathBuf>,
    /// Repo default directory (e.g., `templates/`)
    repo_dir: Option<PathBuf>,
}

impl TemplateLoader {
    /// Create a loader rooted at `root`
    ///
    /// # Arguments
    /// * `root` - Project root used to find the override and repo directories
    /// * `template_dir` - Override directory, relative to `root` unless absolute
    pub fn new(root: impl AsRef<Path>, template_dir: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let user_dir = root.join(template_dir.as_ref());
        let repo_dir = root.join("templates");
        debug!(?user_dir, ?repo_dir, "TemplateLoader::new: called");

        Self {
            raw: engine(false),
            html: engine(true),
            user_dir: user_dir.is_dir().then_some(user_dir),
            repo_dir: repo_dir.is_dir().then_some(repo_dir),
        }
    }

    /// Create a loader that reads overrides from one directory only
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        debug!(?dir, "TemplateLoader::with_dir: called");
        Self {
            raw: engine(false),
            html: engine(true),
            user_dir: Some(dir),
            repo_dir: None,
        }
    }

    /// Create a loader that only uses embedded templates
    pub fn embedded_only() -> Self {
        debug!("TemplateLoader::embedded_only: called");
        Self {
            raw: engine(false),
            html: engine(true),
            user_dir: None,
            repo_dir: None,
        }
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override directory
    /// 2. Repo `templates/` directory
    /// 3. Embedded fallback
    pub fn load_template(&self, name: &str) -> Result<String, TemplateError> {
        debug!(%name, "TemplateLoader::load_template: called");
        let file_name = embedded::file_name(name);

        for dir in [&self.user_dir, &self.repo_dir].into_iter().flatten() {
            let path = dir.join(&file_name);
            if path.exists() {
                debug!(?path, "TemplateLoader::load_template: found on disk");
                return std::fs::read_to_string(&path).map_err(|source| TemplateError::Read {
                    path: path.display().to_string(),
                    source,
                });
            }
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))
    }

    /// Where a template would be loaded from, for diagnostics
    pub fn source_of(&self, name: &str) -> String {
        let file_name = embedded::file_name(name);
        for dir in [&self.user_dir, &self.repo_dir].into_iter().flatten() {
            let path = dir.join(&file_name);
            if path.exists() {
                return path.display().to_string();
            }
        }
        "embedded".to_string()
    }

    /// Substitute the slide tokens into the slide template
    pub fn render_slide(&self, fields: &SlideFields) -> Result<String, TemplateError> {
        debug!(id = %fields.id, "TemplateLoader::render_slide: called");
        fields.validate()?;
        let template = self.load_template("slide")?;
        render(&self.raw, "slide", &template, fields)
    }

    pub fn theme_css(&self) -> Result<String, TemplateError> {
        self.load_template("theme")
    }

    /// Render the offline presentation document
    pub fn render_presenter(&self, ctx: &PresenterContext) -> Result<String, TemplateError> {
        debug!(slide_count = ctx.slide_count, "TemplateLoader::render_presenter: called");
        let template = self.load_template("presenter")?;
        info!("Rendering presentation '{}' ({} slides)", ctx.title, ctx.slide_count);
        render(&self.html, "presenter", &template, ctx)
    }

    /// Wrap a chart script as a registered slide initializer
    pub fn render_chart_init(&self, ctx: &ChartContext) -> Result<String, TemplateError> {
        debug!(slide_id = %ctx.slide_id, "TemplateLoader::render_chart_init: called");
        let template = self.load_template("chart-init")?;
        render(&self.raw, "chart-init", &template, ctx)
    }
}

fn engine(escape_html: bool) -> Handlebars<'static> {
    let mut hbs = Handlebars::new();
    hbs.set_strict_mode(true);
    if !escape_html {
        hbs.register_escape_fn(handlebars::no_escape);
    }
    hbs
}

fn render<T: Serialize>(hbs: &Handlebars<'static>, name: &str, template: &str, data: &T) -> Result<String, TemplateError> {
    hbs.render_template(template, data).map_err(|e| TemplateError::Render {
        name: name.to_string(),
        message: e.to_string(),
    })
}

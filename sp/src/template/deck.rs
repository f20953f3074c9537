//! Deck files: a YAML list of slides rendered one HTML file per slide

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{SlideFields, TemplateError, TemplateLoader};

/// A deck of slides to render through the slide template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Deck {
    /// Informational deck title
    pub title: Option<String>,
    pub slides: Vec<DeckSlide>,
}

/// One slide as written in a deck file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckSlide {
    pub id: Option<String>,
    pub title: String,
    pub subtitle: String,
    /// Inline HTML fragment
    pub content: String,
    /// HTML fragment read from a file, relative to the deck file
    #[serde(rename = "content-file")]
    pub content_file: Option<PathBuf>,
    pub footer: String,
}

impl Deck {
    /// Load a deck, resolving `content-file` entries
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(?path, "Deck::load: called");
        let content = fs::read_to_string(path).context(format!("Failed to read deck {}", path.display()))?;
        let mut deck: Deck = serde_yaml::from_str(&content).context("Failed to parse deck file")?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for slide in &mut deck.slides {
            if let Some(file) = slide.content_file.take() {
                let full = base.join(&file);
                slide.content =
                    fs::read_to_string(&full).context(format!("Failed to read slide content {}", full.display()))?;
            }
        }

        Ok(deck)
    }

    /// Resolve ids (`slide-{n}`, 1-based, when absent) and validate them
    pub fn fields(&self) -> Result<Vec<SlideFields>, TemplateError> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(self.slides.len());

        for (i, slide) in self.slides.iter().enumerate() {
            let id = slide.id.clone().unwrap_or_else(|| format!("slide-{}", i + 1));
            let fields = SlideFields {
                title: slide.title.clone(),
                subtitle: slide.subtitle.clone(),
                content: slide.content.clone(),
                footer: slide.footer.clone(),
                id,
            };
            fields.validate()?;
            if !seen.insert(fields.id.clone()) {
                return Err(TemplateError::DuplicateId(fields.id));
            }
            out.push(fields);
        }

        Ok(out)
    }
}

/// Render every slide of a deck into `out_dir` as `<id>.html`, plus `theme.css`
pub fn render_deck(loader: &TemplateLoader, deck: &Deck, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let slides = deck.fields()?;
    fs::create_dir_all(out_dir).context(format!("Failed to create {}", out_dir.display()))?;

    let mut written = Vec::with_capacity(slides.len());
    for fields in &slides {
        let html = loader.render_slide(fields)?;
        let path = out_dir.join(format!("{}.html", fields.id));
        fs::write(&path, html).context(format!("Failed to write {}", path.display()))?;
        debug!(?path, "render_deck: wrote slide");
        written.push(path);
    }

    fs::write(out_dir.join("theme.css"), loader.theme_css()?).context("Failed to write theme.css")?;

    info!(count = written.len(), dir = ?out_dir, "Rendered deck");
    Ok(written)
}

//! Built-in spacetraveling templates using the Tera template engine
//!
//! Templates and static assets are embedded in the binary. View data handed
//! to the templates is render-ready: text is escaped and paths are encoded
//! by the generator, so autoescaping stays off.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

/// Stylesheet shared by every page
pub const STYLE_CSS: &str = include_str!("spacetraveling/assets/style.css");

/// Site logo
pub const LOGO_SVG: &str = include_str!("spacetraveling/assets/logo.svg");

/// Browser side of the home feed's "load more" link
pub const LOAD_MORE_JS: &str = include_str!("spacetraveling/assets/load-more.js");

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("spacetraveling/layout.html")),
            ("index.html", include_str!("spacetraveling/index.html")),
            ("post.html", include_str!("spacetraveling/post.html")),
            ("loading.html", include_str!("spacetraveling/loading.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("spacetraveling/partials/header.html"),
            ),
            (
                "partials/exit_preview.html",
                include_str!("spacetraveling/partials/exit_preview.html"),
            ),
            (
                "partials/comments.html",
                include_str!("spacetraveling/partials/comments.html"),
            ),
            (
                "partials/neighbors.html",
                include_str!("spacetraveling/partials/neighbors.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub language: String,
    /// IANA zone used for every displayed date
    pub timezone: String,
    pub exit_preview_path: String,
    pub comments: Option<CommentsData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentsData {
    pub repo: String,
    pub issue_term: String,
    pub theme: String,
}

/// A post as listed on the home feed
#[derive(Debug, Clone, Serialize)]
pub struct PostSummaryData {
    pub path: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
}

/// A post detail page
#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    /// Absolute URL of the page
    pub url: String,
    pub title: String,
    pub author: String,
    pub banner_url: String,
    pub date: String,
    pub edited_at: Option<String>,
    pub reading_time: usize,
    pub sections: Vec<SectionData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionData {
    pub heading: String,
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavPost {
    pub title: String,
    pub path: String,
}

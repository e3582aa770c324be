//! Generator module - renders the site to static HTML files using the built-in templates

use anyhow::{Context as _, Result};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::SystemTime;

use chrono_tz::Tz;
use tera::Context;

use crate::content::{ContentLoader, Neighbor, Post, PostPage, PostPagination, PreviewContext};
use crate::helpers::{edited_at, full_url_for, html_escape, post_path, publication_date, script_json};
use crate::prismic::rich_text;
use crate::prismic::ContentSource;
use crate::templates::{
    CommentsData, NavPost, PostData, PostSummaryData, SectionData, SiteData, TemplateRenderer,
    LOAD_MORE_JS, LOGO_SVG, STYLE_CSS,
};
use crate::Blog;

/// Seconds between two reloads of the loading placeholder
const LOADING_REFRESH_SECONDS: u64 = 2;

/// Summary of a full generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub posts: usize,
    pub skipped: usize,
    pub pruned: usize,
}

/// Static site generator backed by a content source
pub struct Generator<C> {
    blog: Blog,
    renderer: TemplateRenderer,
    source: C,
}

impl<C: ContentSource> Generator<C> {
    /// Create a new generator
    pub fn new(blog: &Blog, source: C) -> Result<Self> {
        Ok(Self {
            blog: blog.clone(),
            renderer: TemplateRenderer::new()?,
            source,
        })
    }

    pub fn source(&self) -> &C {
        &self.source
    }

    fn loader(&self) -> ContentLoader<'_, C> {
        ContentLoader::new(&self.source, &self.blog.config.prismic)
    }

    /// Generate the entire published site
    pub async fn generate(&self) -> Result<GenerateStats> {
        let started = SystemTime::now();
        let ctx = self.loader().pin(&PreviewContext::published()).await?;
        let public_dir = &self.blog.public_dir;
        fs::create_dir_all(public_dir)
            .with_context(|| format!("Failed to create {:?}", public_dir))?;

        self.write_assets()?;

        // Home feed and its initial pagination state
        let home = self.loader().load_home(&ctx).await?;
        self.write_file(Path::new("index.html"), &self.render_home_page(&home, false)?)?;
        self.write_file(Path::new("posts.json"), &serde_json::to_string_pretty(&home)?)?;
        tracing::info!("Generated home with {} posts", home.results.len());

        // One page per post
        let posts = self.loader().load_all(&ctx).await?;
        let mut stats = GenerateStats::default();
        let mut generated = HashSet::new();

        for post in &posts {
            let Some(uid) = post.uid.as_deref().filter(|u| is_safe_uid(u)) else {
                tracing::warn!("Skipping post without a usable uid: {:?}", post.uid);
                stats.skipped += 1;
                continue;
            };

            let page = self.loader().load_post(uid, &ctx).await?;
            self.write_post(uid, &self.render_post_page(&page)?)?;
            generated.insert(uid.to_string());
            stats.posts += 1;
        }

        stats.pruned = self.prune_stale_posts(&generated, started)?;

        Ok(stats)
    }

    /// Generate a single post page on demand
    ///
    /// Returns `false` when the repository has no such post.
    pub async fn generate_post(&self, uid: &str) -> Result<bool> {
        if !is_safe_uid(uid) {
            return Ok(false);
        }

        let ctx = self.loader().pin(&PreviewContext::published()).await?;
        match self.loader().load_post(uid, &ctx).await {
            Ok(page) => {
                self.write_post(uid, &self.render_post_page(&page)?)?;
                Ok(true)
            }
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch and render the home page for a request
    pub async fn render_home(&self, ctx: &PreviewContext) -> Result<String> {
        let ctx = self.loader().pin(ctx).await?;
        let home = self.loader().load_home(&ctx).await?;
        self.render_home_page(&home, ctx.preview)
    }

    /// Fetch and render a post page for a request, `None` for unknown uids
    pub async fn render_post(&self, uid: &str, ctx: &PreviewContext) -> Result<Option<String>> {
        let ctx = self.loader().pin(ctx).await?;
        match self.loader().load_post(uid, &ctx).await {
            Ok(page) => Ok(Some(self.render_post_page(&page)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Render the home feed
    pub fn render_home_page(&self, home: &PostPagination, preview: bool) -> Result<String> {
        let tz = self.blog.config.tz();
        let posts: Vec<PostSummaryData> = home.results.iter().map(|p| summary_data(p, tz)).collect();

        let mut context = self.create_base_context();
        context.insert("posts", &posts);
        context.insert("has_more", &home.has_more());
        context.insert("state_json", &script_json(home)?);
        context.insert("preview", &preview);

        self.renderer.render("index.html", &context)
    }

    /// Render a post detail page
    pub fn render_post_page(&self, page: &PostPage) -> Result<String> {
        let config = &self.blog.config;
        let mut post = post_data(&page.post, config.tz());
        if let Some(uid) = page.post.uid.as_deref() {
            post.url = html_escape(&full_url_for(config, &post_path(uid)));
        }

        let mut context = self.create_base_context();
        context.insert("post", &post);
        context.insert("prev_post", &page.prev_post.as_ref().map(nav_post));
        context.insert("next_post", &page.next_post.as_ref().map(nav_post));
        context.insert("preview", &page.preview);

        self.renderer.render("post.html", &context)
    }

    /// Placeholder shown while a post page is being generated
    pub fn render_loading(&self) -> Result<String> {
        let mut context = self.create_base_context();
        context.insert("refresh_seconds", &LOADING_REFRESH_SECONDS);
        self.renderer.render("loading.html", &context)
    }

    /// Create a base context with common variables
    fn create_base_context(&self) -> Context {
        let config = &self.blog.config;
        let comments = (!config.comments.repo.trim().is_empty()).then(|| CommentsData {
            repo: html_escape(&config.comments.repo),
            issue_term: html_escape(&config.comments.issue_term),
            theme: html_escape(&config.comments.theme),
        });

        let site = SiteData {
            title: html_escape(&config.title),
            language: html_escape(&config.language),
            timezone: html_escape(&config.timezone),
            exit_preview_path: html_escape(&config.exit_preview_path),
            comments,
        };

        let mut context = Context::new();
        context.insert("site", &site);
        context
    }

    fn write_assets(&self) -> Result<()> {
        self.write_file(Path::new("style.css"), STYLE_CSS)?;
        self.write_file(Path::new("logo.svg"), LOGO_SVG)?;
        self.write_file(Path::new("load-more.js"), LOAD_MORE_JS)?;
        Ok(())
    }

    fn write_post(&self, uid: &str, html: &str) -> Result<()> {
        let relative = Path::new("post").join(uid).join("index.html");
        self.write_file(&relative, html)?;
        tracing::debug!("Generated post: {}", uid);
        Ok(())
    }

    /// Write a file under the public dir
    ///
    /// The content goes to a temporary file in the target directory first and
    /// is then renamed over the target, so readers never see a partial page.
    fn write_file(&self, relative: &Path, content: &str) -> Result<()> {
        let output_path = self.blog.public_dir.join(relative);
        let parent = output_path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("No parent directory for {:?}", output_path))?;
        fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;

        let mut file = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| anyhow::anyhow!("Failed to create temp file in {:?}: {}", parent, e))?;
        file.write_all(content.as_bytes())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))?;
        }
        file.persist(&output_path)
            .map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", output_path, e.error))?;
        Ok(())
    }

    /// Remove pages of posts that no longer exist upstream
    ///
    /// Pages written at or after `started` are kept: they come from on-demand
    /// generation running alongside this build.
    fn prune_stale_posts(&self, keep: &HashSet<String>, started: SystemTime) -> Result<usize> {
        let post_dir = self.blog.public_dir.join("post");
        if !post_dir.exists() {
            return Ok(0);
        }

        let mut pruned = 0;
        for entry in fs::read_dir(&post_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !entry.path().is_dir() || keep.contains(&name) {
                continue;
            }

            let modified = fs::metadata(entry.path().join("index.html")).and_then(|m| m.modified());
            if matches!(modified, Ok(time) if time >= started) {
                tracing::debug!("Keeping post written during the build: {}", name);
                continue;
            }

            fs::remove_dir_all(entry.path())?;
            tracing::info!("Removed stale post: {}", name);
            pruned += 1;
        }

        Ok(pruned)
    }
}

/// Whether a uid can be used as a single directory name
pub fn is_safe_uid(uid: &str) -> bool {
    !uid.is_empty()
        && uid != "."
        && uid != ".."
        && !uid.contains(['/', '\\'])
        && !uid.chars().any(char::is_control)
}

fn text(value: &Option<String>) -> String {
    value.as_deref().map(html_escape).unwrap_or_default()
}

fn summary_data(post: &Post, tz: Tz) -> PostSummaryData {
    PostSummaryData {
        path: post.uid.as_deref().map(post_path).unwrap_or_default(),
        title: text(&post.data.title),
        subtitle: text(&post.data.subtitle),
        author: text(&post.data.author),
        date: post
            .first_publication_date
            .map(|d| publication_date(&d.with_timezone(&tz)))
            .unwrap_or_default(),
    }
}

fn post_data(post: &Post, tz: Tz) -> PostData {
    let sections = post
        .data
        .content
        .iter()
        .map(|block| SectionData {
            heading: text(&block.heading),
            html: rich_text::as_html(&block.body),
        })
        .collect();

    PostData {
        url: String::new(),
        title: text(&post.data.title),
        author: text(&post.data.author),
        banner_url: post
            .data
            .banner
            .as_ref()
            .map(|b| text(&b.url))
            .unwrap_or_default(),
        date: post
            .first_publication_date
            .map(|d| publication_date(&d.with_timezone(&tz)))
            .unwrap_or_default(),
        // Shown whenever the value exists, even if equal to the first publication
        edited_at: post
            .last_publication_date
            .map(|d| edited_at(&d.with_timezone(&tz))),
        reading_time: post.reading_time(),
        sections,
    }
}

fn nav_post(neighbor: &Neighbor) -> NavPost {
    NavPost {
        title: text(&neighbor.title),
        path: neighbor
            .uid
            .as_deref()
            .map(post_path)
            .unwrap_or_else(|| "/".to_string()),
    }
}

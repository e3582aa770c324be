//! Content loader - fetches posts from the content repository

use super::pagination::PostPagination;
use super::post::{Neighbor, Post};
use super::preview::PreviewContext;
use super::projection::{project_detail, project_neighbor, SUMMARY_FIELDS};
use crate::config::PrismicConfig;
use crate::prismic::predicates::{ORDER_FIRST_PUBLICATION_ASC, ORDER_FIRST_PUBLICATION_DESC};
use crate::prismic::{ContentError, ContentSource, Predicate};

/// Everything the post detail page needs
#[derive(Debug, Clone, PartialEq)]
pub struct PostPage {
    pub post: Post,
    pub prev_post: Option<Neighbor>,
    pub next_post: Option<Neighbor>,
    pub preview: bool,
}

/// Loads posts through a [`ContentSource`]
pub struct ContentLoader<'a, C> {
    source: &'a C,
    config: &'a PrismicConfig,
}

impl<'a, C: ContentSource> ContentLoader<'a, C> {
    /// Create a new content loader
    pub fn new(source: &'a C, config: &'a PrismicConfig) -> Self {
        Self { source, config }
    }

    fn type_predicate(&self) -> [Predicate; 1] {
        [Predicate::document_type(&self.config.document_type)]
    }

    /// Pin `ctx` to a concrete release
    ///
    /// Published contexts get the current master ref, so every query made with
    /// the result reads the same release. Contexts with a ref are kept.
    pub async fn pin(&self, ctx: &PreviewContext) -> Result<PreviewContext, ContentError> {
        if ctx.reference.is_some() {
            return Ok(ctx.clone());
        }
        let master = self.source.master_ref().await?;
        tracing::debug!("Pinned master ref {}", master);
        Ok(PreviewContext::release(&master))
    }

    /// First page of the home feed
    pub async fn load_home(&self, ctx: &PreviewContext) -> Result<PostPagination, ContentError> {
        let fields = SUMMARY_FIELDS
            .iter()
            .map(|f| format!("{}.{}", self.config.document_type, f));
        let options = ctx
            .query_options()
            .fetch(fields)
            .page_size(self.config.page_size);

        let response = self.source.query(&self.type_predicate(), &options).await?;
        tracing::debug!(
            "Home feed: {} posts, {} total",
            response.results.len(),
            response.total_results_size
        );
        Ok(PostPagination::from_response(&response))
    }

    /// Every post, following the cursor until the last page
    pub async fn load_all(&self, ctx: &PreviewContext) -> Result<Vec<Post>, ContentError> {
        let response = self
            .source
            .query(&self.type_predicate(), &ctx.query_options())
            .await?;
        let mut pagination = PostPagination::from_response(&response);

        while pagination.has_more() {
            if pagination.load_more(self.source).await? == 0 && pagination.has_more() {
                tracing::warn!("Empty page with a cursor, stopping at {} posts", pagination.results.len());
                break;
            }
        }

        Ok(pagination.results)
    }

    /// A post with its neighbours
    pub async fn load_post(&self, uid: &str, ctx: &PreviewContext) -> Result<PostPage, ContentError> {
        let document = self
            .source
            .get_by_uid(&self.config.document_type, uid, &ctx.query_options())
            .await?;

        let prev_post = self
            .neighbor(&document.id, ORDER_FIRST_PUBLICATION_ASC, ctx)
            .await?;
        let next_post = self
            .neighbor(&document.id, ORDER_FIRST_PUBLICATION_DESC, ctx)
            .await?;

        Ok(PostPage {
            post: project_detail(&document),
            prev_post,
            next_post,
            preview: ctx.preview,
        })
    }

    /// The single document right after `id` in `orderings`
    async fn neighbor(
        &self,
        id: &str,
        orderings: &str,
        ctx: &PreviewContext,
    ) -> Result<Option<Neighbor>, ContentError> {
        let options = ctx
            .query_options()
            .page_size(1)
            .after(id)
            .orderings(orderings);
        let response = self.source.query(&self.type_predicate(), &options).await?;
        Ok(response.results.first().map(project_neighbor))
    }
}

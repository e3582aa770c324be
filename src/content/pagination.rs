//! Cursor pagination of the post feed

use serde::{Deserialize, Serialize};

use super::post::Post;
use super::projection::project_summary;
use crate::prismic::{ContentError, ContentSource, QueryResponse};

/// Posts loaded so far plus the cursor of the following page
///
/// The only transition is [`append_page`](Self::append_page): the list grows
/// by concatenation and the cursor is replaced. Nothing is reordered,
/// removed or de-duplicated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostPagination {
    /// Cursor URL, `None` once the last page has been loaded
    pub next_page: Option<String>,
    pub results: Vec<Post>,
}

impl PostPagination {
    /// First page of a query
    pub fn from_response(response: &QueryResponse) -> Self {
        Self {
            next_page: response.next_page.clone(),
            results: response.results.iter().map(project_summary).collect(),
        }
    }

    /// Whether another page can be requested
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// Append a page of posts in arrival order and replace the cursor
    pub fn append_page(&mut self, results: Vec<Post>, next_page: Option<String>) {
        self.results.extend(results);
        self.next_page = next_page;
    }

    /// Fetch the page behind the cursor and append it
    ///
    /// Returns the number of posts appended, `0` when there is no cursor.
    /// On error nothing changes, so the call can simply be retried.
    pub async fn load_more<C: ContentSource>(&mut self, source: &C) -> Result<usize, ContentError> {
        let Some(cursor) = self.next_page.as_deref() else {
            return Ok(0);
        };

        let response = source.fetch_page(cursor).await?;
        let posts: Vec<Post> = response.results.iter().map(project_summary).collect();
        let count = posts.len();

        tracing::debug!(
            "Loaded {} more posts (more pages: {})",
            count,
            response.next_page.is_some()
        );
        self.append_page(posts, response.next_page);

        Ok(count)
    }
}

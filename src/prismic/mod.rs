//! Prismic content client
//!
//! Everything the site knows about the remote repository goes through
//! [`ContentSource`]: predicate queries, cursor pagination and lookups by
//! uid or id. [`PrismicClient`] is the HTTP implementation; tests drive the
//! generator with an in-memory one.

mod client;
mod error;
#[cfg(test)]
pub mod memory;
pub mod predicates;
pub mod rich_text;
mod types;

use std::future::Future;

pub use client::PrismicClient;
pub use error::ContentError;
pub use predicates::{Predicate, QueryOptions};
pub use types::{ApiDescriptor, Document, QueryResponse, Ref, RichTextNode, Span};

/// Read access to a content repository
pub trait ContentSource: Send + Sync {
    /// The ref of the currently published release
    fn master_ref(&self) -> impl Future<Output = Result<String, ContentError>> + Send;

    /// Search documents matching all predicates
    fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> impl Future<Output = Result<QueryResponse, ContentError>> + Send;

    /// Follow a `next_page` cursor URL
    fn fetch_page(
        &self,
        cursor: &str,
    ) -> impl Future<Output = Result<QueryResponse, ContentError>> + Send;

    /// Fetch a single document of `doc_type` by its uid
    fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        options: &QueryOptions,
    ) -> impl Future<Output = Result<Document, ContentError>> + Send {
        async move {
            let predicates = [Predicate::at(&format!("my.{}.uid", doc_type), uid)];
            let options = options.clone().page_size(1);
            let response = self.query(&predicates, &options).await?;
            response
                .results
                .into_iter()
                .next()
                .ok_or_else(|| ContentError::NotFound {
                    doc_type: doc_type.to_string(),
                    uid: uid.to_string(),
                })
        }
    }

    /// Fetch a single document by its id, `None` when it does not exist
    fn get_by_id(
        &self,
        id: &str,
        options: &QueryOptions,
    ) -> impl Future<Output = Result<Option<Document>, ContentError>> + Send {
        async move {
            let predicates = [Predicate::at("document.id", id)];
            let options = options.clone().page_size(1);
            let response = self.query(&predicates, &options).await?;
            Ok(response.results.into_iter().next())
        }
    }
}

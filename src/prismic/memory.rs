//! In-memory content source for tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::json;

use super::predicates::{Predicate, QueryOptions};
use super::types::{Document, QueryResponse};
use super::{ContentError, ContentSource};

const DEFAULT_PAGE_SIZE: usize = 20;

/// A post document published at noon UTC on `date` (`YYYY-MM-DD`)
pub fn doc(uid: &str, date: &str) -> Document {
    Document {
        id: format!("id-{}", uid),
        uid: Some(uid.to_string()),
        doc_type: "post".to_string(),
        href: None,
        tags: Vec::new(),
        lang: Some("pt-br".to_string()),
        first_publication_date: Some(format!("{}T12:00:00+0000", date)),
        last_publication_date: None,
        data: json!({
            "title": format!("Post {}", uid),
            "subtitle": format!("Subtitle of {}", uid),
            "author": "Danilo Vieira",
            "banner": {"url": format!("https://images.prismic.io/{}.png", uid)},
            "content": [{
                "heading": "Introdução",
                "body": [{"type": "paragraph", "text": "Lorem ipsum dolor sit amet", "spans": []}]
            }]
        }),
    }
}

/// Documents held in memory, with optional draft releases keyed by ref
#[derive(Default)]
pub struct MemorySource {
    documents: Vec<Document>,
    releases: HashMap<String, Vec<Document>>,
    /// Options of every query, in call order
    pub queries: Mutex<Vec<QueryOptions>>,
    master_refs: AtomicUsize,
    unavailable: bool,
}

impl MemorySource {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            ..Default::default()
        }
    }

    /// Serve `documents` to queries carrying `reference`
    pub fn with_release(mut self, reference: &str, documents: Vec<Document>) -> Self {
        self.releases.insert(reference.to_string(), documents);
        self
    }

    /// Fail every request, like an unreachable repository
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Number of master ref lookups so far
    pub fn master_ref_calls(&self) -> usize {
        self.master_refs.load(Ordering::SeqCst)
    }

    fn check_available(&self, url: &str) -> Result<(), ContentError> {
        if self.unavailable {
            return Err(ContentError::Status {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                url: url.to_string(),
            });
        }
        Ok(())
    }

    /// A page of the published posts in insertion order
    pub fn page(&self, page: usize, size: usize) -> QueryResponse {
        let options = QueryOptions::new().page(page).page_size(size);
        self.search(&[Predicate::document_type("post")], &options)
    }

    fn search(&self, predicates: &[Predicate], options: &QueryOptions) -> QueryResponse {
        let documents = match options.reference.as_deref() {
            Some(r) if r != "master" => self.releases.get(r).cloned().unwrap_or_default(),
            _ => self.documents.clone(),
        };

        let mut matching: Vec<Document> = documents
            .into_iter()
            .filter(|d| predicates.iter().all(|p| matches(d, p)))
            .collect();

        if let Some(ref orderings) = options.orderings {
            if orderings.contains("first_publication_date") {
                matching.sort_by(|a, b| a.first_publication_date.cmp(&b.first_publication_date));
                if orderings.contains("desc") {
                    matching.reverse();
                }
            }
        }

        if let Some(ref after) = options.after {
            matching = match matching.iter().position(|d| &d.id == after) {
                Some(pos) => matching.split_off(pos + 1),
                None => Vec::new(),
            };
        }

        let size = options.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let page = options.page.unwrap_or(1).max(1);
        let total = matching.len();
        let total_pages = total.div_ceil(size);
        let results: Vec<Document> = matching.into_iter().skip((page - 1) * size).take(size).collect();

        QueryResponse {
            page,
            results_per_page: size,
            results_size: results.len(),
            total_results_size: total,
            total_pages,
            next_page: (page < total_pages)
                .then(|| format!("memory://search?page={}&size={}", page + 1, size)),
            prev_page: (page > 1).then(|| format!("memory://search?page={}&size={}", page - 1, size)),
            results,
        }
    }
}

fn matches(doc: &Document, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::At { path, value } => match path.as_str() {
            "document.type" => &doc.doc_type == value,
            "document.id" => &doc.id == value,
            p if p.ends_with(".uid") => doc.uid.as_ref() == Some(value),
            _ => false,
        },
    }
}

impl ContentSource for MemorySource {
    async fn master_ref(&self) -> Result<String, ContentError> {
        self.master_refs.fetch_add(1, Ordering::SeqCst);
        self.check_available("memory://api")?;
        Ok("master".to_string())
    }

    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<QueryResponse, ContentError> {
        self.queries
            .lock()
            .expect("query log poisoned")
            .push(options.clone());
        self.check_available("memory://search")?;
        Ok(self.search(predicates, options))
    }

    async fn fetch_page(&self, cursor: &str) -> Result<QueryResponse, ContentError> {
        self.check_available(cursor)?;
        let params: HashMap<&str, usize> = cursor
            .strip_prefix("memory://search?")
            .unwrap_or("")
            .split('&')
            .filter_map(|kv| kv.split_once('='))
            .filter_map(|(k, v)| Some((k, v.parse().ok()?)))
            .collect();

        match (params.get("page"), params.get("size")) {
            (Some(&page), Some(&size)) => Ok(self.page(page, size)),
            _ => Err(ContentError::Status {
                status: reqwest::StatusCode::BAD_GATEWAY,
                url: cursor.to_string(),
            }),
        }
    }
}

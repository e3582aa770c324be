//! Query predicates and options

use std::fmt;

/// A single query predicate, e.g. `[at(document.type, "post")]`
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    At { path: String, value: String },
}

impl Predicate {
    /// Exact match of a fragment path against a value
    pub fn at(path: &str, value: &str) -> Self {
        Predicate::At {
            path: path.to_string(),
            value: value.to_string(),
        }
    }

    /// Match on the document custom type
    pub fn document_type(doc_type: &str) -> Self {
        Self::at("document.type", doc_type)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::At { path, value } => {
                let value = value.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "[at({}, \"{}\")]", path, value)
            }
        }
    }
}

/// Build the `q` parameter from a list of predicates
pub fn query_string(predicates: &[Predicate]) -> String {
    let inner: String = predicates.iter().map(|p| p.to_string()).collect();
    format!("[{}]", inner)
}

/// Ordering by first publication date, oldest first
pub const ORDER_FIRST_PUBLICATION_ASC: &str = "[document.first_publication_date]";

/// Ordering by first publication date, newest first
pub const ORDER_FIRST_PUBLICATION_DESC: &str = "[document.first_publication_date desc]";

/// Search options besides predicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Restrict returned `data` to these `type.field` names
    pub fetch: Vec<String>,
    pub page_size: Option<usize>,
    pub page: Option<usize>,
    /// Content release; master ref when absent
    pub reference: Option<String>,
    /// Only documents positioned after this document id in the ordering
    pub after: Option<String>,
    pub orderings: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    pub fn reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }

    pub fn after(mut self, id: &str) -> Self {
        self.after = Some(id.to_string());
        self
    }

    pub fn orderings(mut self, orderings: &str) -> Self {
        self.orderings = Some(orderings.to_string());
        self
    }

    /// Query string parameters, without `ref` and `q`
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if !self.fetch.is_empty() {
            params.push(("fetch", self.fetch.join(",")));
        }
        if let Some(size) = self.page_size {
            params.push(("pageSize", size.to_string()));
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(ref after) = self.after {
            params.push(("after", after.clone()));
        }
        if let Some(ref orderings) = self.orderings {
            params.push(("orderings", orderings.clone()));
        }
        params
    }
}

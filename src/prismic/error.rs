//! Content client errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("content API answered {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("failed to decode content API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no {doc_type} document with uid {uid:?}")]
    NotFound { doc_type: String, uid: String },

    #[error("content API exposes no master ref")]
    NoMasterRef,

    #[error("content endpoint is not configured")]
    MissingEndpoint,
}

impl ContentError {
    /// Whether the error means the requested document does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ContentError::NotFound { .. })
    }
}

//! Preview mode context

use crate::prismic::QueryOptions;

/// Name of the cookie holding the preview ref
pub const PREVIEW_COOKIE: &str = "io.prismic.preview";

/// Whether a request previews draft content, and which release it sees
///
/// Passed explicitly into every content fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewContext {
    pub preview: bool,
    /// Opaque release ref; `None` means the published master ref
    pub reference: Option<String>,
}

impl PreviewContext {
    /// Published content
    pub fn published() -> Self {
        Self::default()
    }

    /// Draft content selected by a preview ref
    pub fn draft(reference: &str) -> Self {
        Self {
            preview: true,
            reference: Some(reference.to_string()),
        }
    }

    /// Published content pinned to a resolved release ref
    pub fn release(reference: &str) -> Self {
        Self {
            preview: false,
            reference: Some(reference.to_string()),
        }
    }

    /// Build the context from a raw `Cookie` header value
    pub fn from_cookie_header(header: Option<&str>) -> Self {
        header
            .and_then(|h| cookie_value(h, PREVIEW_COOKIE))
            .filter(|v| !v.is_empty())
            .map(|v| Self::draft(&v))
            .unwrap_or_default()
    }

    /// Base query options carrying this context's ref
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions::new().reference(self.reference.clone())
    }
}

fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        if key.trim() != name {
            return None;
        }
        let value = value.trim().trim_matches('"');
        Some(
            percent_encoding::percent_decode_str(value)
                .decode_utf8_lossy()
                .into_owned(),
        )
    })
}

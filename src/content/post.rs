//! Post view models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::prismic::rich_text;
use crate::prismic::RichTextNode;

/// Average reading speed used for the reading time estimate
pub const WORDS_PER_MINUTE: usize = 200;

/// A blog post projected from a content document
///
/// Every field sourced from the API is optional; renderers show blanks for
/// missing values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub uid: Option<String>,

    pub first_publication_date: Option<DateTime<Utc>>,

    /// Only projected for the detail page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_publication_date: Option<DateTime<Utc>>,

    pub data: PostData,
}

/// Post fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostData {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<Banner>,

    /// Sections in source order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub url: Option<String>,
}

/// A post section: a heading followed by rich text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub heading: Option<String>,
    pub body: Vec<RichTextNode>,
}

impl ContentBlock {
    /// Whitespace-delimited words in the body
    pub fn word_count(&self) -> usize {
        rich_text::as_text(&self.body).split_whitespace().count()
    }
}

impl Post {
    /// Total words across all sections
    pub fn word_count(&self) -> usize {
        self.data.content.iter().map(ContentBlock::word_count).sum()
    }

    /// Estimated minutes to read, rounded up
    pub fn reading_time(&self) -> usize {
        reading_time(self.word_count())
    }
}

/// Minutes needed to read `words` words at [`WORDS_PER_MINUTE`], rounded up
pub fn reading_time(words: usize) -> usize {
    words.div_ceil(WORDS_PER_MINUTE)
}

/// A neighbouring post, only used to render a navigation link
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub uid: Option<String>,
    pub title: Option<String>,
}

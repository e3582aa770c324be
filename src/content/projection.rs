//! Projection of raw documents into posts

use serde_json::Value;

use super::post::{Banner, ContentBlock, Neighbor, Post, PostData};
use crate::helpers::parse_timestamp;
use crate::prismic::rich_text;
use crate::prismic::{Document, RichTextNode};

/// Fields requested for the home feed
pub const SUMMARY_FIELDS: [&str; 3] = ["title", "subtitle", "author"];

/// Post as listed on the home feed: uid, first publication date, title,
/// subtitle and author
pub fn project_summary(doc: &Document) -> Post {
    Post {
        uid: doc.uid.clone(),
        first_publication_date: timestamp(doc.first_publication_date.as_deref()),
        last_publication_date: None,
        data: PostData {
            title: text_field(&doc.data, "title"),
            subtitle: text_field(&doc.data, "subtitle"),
            author: text_field(&doc.data, "author"),
            banner: None,
            content: Vec::new(),
        },
    }
}

/// Post with everything the detail page renders
pub fn project_detail(doc: &Document) -> Post {
    let mut post = project_summary(doc);
    post.last_publication_date = timestamp(doc.last_publication_date.as_deref());
    post.data.banner = Some(Banner {
        url: doc
            .data
            .get("banner")
            .and_then(|b| b.get("url"))
            .and_then(Value::as_str)
            .map(str::to_string),
    });
    post.data.content = doc
        .data
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| blocks.iter().map(project_block).collect())
        .unwrap_or_default();
    post
}

/// Reduced reference used for previous/next links
pub fn project_neighbor(doc: &Document) -> Neighbor {
    Neighbor {
        uid: doc.uid.clone(),
        title: text_field(&doc.data, "title"),
    }
}

fn project_block(block: &Value) -> ContentBlock {
    let body = block
        .get("body")
        .and_then(Value::as_array)
        .map(|nodes| rich_text_nodes(nodes))
        .unwrap_or_default();

    ContentBlock {
        heading: text_field(block, "heading"),
        body,
    }
}

fn rich_text_nodes(nodes: &[Value]) -> Vec<RichTextNode> {
    nodes
        .iter()
        .filter_map(|node| match serde_json::from_value(node.clone()) {
            Ok(node) => Some(node),
            Err(e) => {
                tracing::warn!("Skipping malformed rich text node: {}", e);
                None
            }
        })
        .collect()
}

/// A text field is either Key Text (a string) or a Title / Rich Text field
fn text_field(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Array(nodes) => Some(rich_text::as_text(&rich_text_nodes(nodes))),
        _ => None,
    }
}

fn timestamp(value: Option<&str>) -> Option<chrono::DateTime<chrono::Utc>> {
    let value = value?;
    let parsed = parse_timestamp(value);
    if parsed.is_none() {
        tracing::warn!("Ignoring unparsable timestamp {:?}", value);
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn document(data: Value) -> Document {
        Document {
            id: "YF0F1xIAACIAnzYq".to_string(),
            uid: Some("como-utilizar-hooks".to_string()),
            doc_type: "post".to_string(),
            href: None,
            tags: Vec::new(),
            lang: Some("pt-br".to_string()),
            first_publication_date: Some("2021-03-15T19:25:28+0000".to_string()),
            last_publication_date: Some("2021-03-25T19:27:35+0000".to_string()),
            data,
        }
    }

    #[test]
    fn test_summary_projection() {
        let doc = document(json!({
            "title": "Como utilizar Hooks",
            "subtitle": "Pensando em sincronização em vez de ciclos de vida",
            "author": "Joseph Oliveira",
            "banner": {"url": "https://images.prismic.io/banner.png"},
            "content": []
        }));

        let post = project_summary(&doc);
        assert_eq!(post.uid.as_deref(), Some("como-utilizar-hooks"));
        assert_eq!(
            post.first_publication_date,
            Some(chrono::Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap())
        );
        assert_eq!(post.last_publication_date, None);
        assert_eq!(post.data.title.as_deref(), Some("Como utilizar Hooks"));
        assert_eq!(post.data.author.as_deref(), Some("Joseph Oliveira"));
        assert!(post.data.banner.is_none());
        assert!(post.data.content.is_empty());
    }

    #[test]
    fn test_detail_projection_keeps_block_order() {
        let doc = document(json!({
            "title": "Ordem",
            "banner": {"url": "https://images.prismic.io/banner.png"},
            "content": [
                {"heading": "A", "body": [{"type": "paragraph", "text": "a", "spans": []}]},
                {"heading": "B", "body": [{"type": "paragraph", "text": "b", "spans": []}]},
                {"heading": "C", "body": [
                    {"type": "paragraph", "text": "c1", "spans": []},
                    {"type": "list-item", "text": "c2", "spans": []}
                ]}
            ]
        }));

        let post = project_detail(&doc);
        let headings: Vec<_> = post
            .data
            .content
            .iter()
            .map(|b| b.heading.as_deref().unwrap())
            .collect();
        assert_eq!(headings, vec!["A", "B", "C"]);

        let last: Vec<_> = post.data.content[2]
            .body
            .iter()
            .map(|n| n.text.as_str())
            .collect();
        assert_eq!(last, vec!["c1", "c2"]);

        assert_eq!(
            post.data.banner.unwrap().url.as_deref(),
            Some("https://images.prismic.io/banner.png")
        );
        assert!(post.last_publication_date.is_some());
    }

    #[test]
    fn test_missing_fields_degrade_to_none() {
        let mut doc = document(json!({
            "title": 42,
            "banner": null,
            "content": [{"body": "not an array"}]
        }));
        doc.uid = None;
        doc.first_publication_date = Some("not a date".to_string());

        let post = project_detail(&doc);
        assert!(post.uid.is_none());
        assert!(post.first_publication_date.is_none());
        assert!(post.data.title.is_none());
        assert!(post.data.subtitle.is_none());
        assert_eq!(post.data.banner, Some(Banner { url: None }));
        assert_eq!(post.data.content.len(), 1);
        assert!(post.data.content[0].heading.is_none());
        assert!(post.data.content[0].body.is_empty());
    }

    #[test]
    fn test_title_as_rich_text() {
        let doc = document(json!({
            "title": [{"type": "heading1", "text": "Título rico", "spans": []}]
        }));
        assert_eq!(project_neighbor(&doc).title.as_deref(), Some("Título rico"));
    }

    #[test]
    fn test_malformed_node_skipped() {
        let doc = document(json!({
            "content": [{"heading": "A", "body": [{"text": "no type"}, {"type": "paragraph", "text": "ok"}]}]
        }));
        let post = project_detail(&doc);
        assert_eq!(post.data.content[0].body.len(), 1);
        assert_eq!(post.data.content[0].body[0].text, "ok");
    }
}

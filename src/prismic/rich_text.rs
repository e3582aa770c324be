//! Rich text serialization
//!
//! Turns the structured rich text of a document into plain text (for word
//! counts) or escaped HTML (for the post body).

use std::cmp::Reverse;

use super::types::{RichTextNode, Span};
use crate::helpers::{html_escape, post_path};

/// Plain text of all blocks, joined with a single space
pub fn as_text(nodes: &[RichTextNode]) -> String {
    nodes
        .iter()
        .map(|n| n.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// HTML for a sequence of blocks
///
/// Consecutive list items are grouped into a single `<ul>` or `<ol>`.
pub fn as_html(nodes: &[RichTextNode]) -> String {
    let mut html = String::new();
    let mut open_list: Option<&'static str> = None;

    for node in nodes {
        let list_tag = match node.kind.as_str() {
            "list-item" => Some("ul"),
            "o-list-item" => Some("ol"),
            _ => None,
        };

        if open_list != list_tag {
            if let Some(tag) = open_list {
                html.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list_tag {
                html.push_str(&format!("<{}>", tag));
            }
            open_list = list_tag;
        }

        html.push_str(&serialize_block(node));
    }

    if let Some(tag) = open_list {
        html.push_str(&format!("</{}>", tag));
    }

    html
}

fn serialize_block(node: &RichTextNode) -> String {
    let kind = node.kind.as_str();

    if let Some(level) = heading_level(kind) {
        return format!("<h{0}>{1}</h{0}>", level, serialize_spans(node));
    }

    match kind {
        "paragraph" => format!("<p>{}</p>", serialize_spans(node)),
        "preformatted" => format!("<pre>{}</pre>", serialize_spans(node)),
        "list-item" | "o-list-item" => format!("<li>{}</li>", serialize_spans(node)),
        "image" => format!(
            r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
            html_escape(node.url.as_deref().unwrap_or("")),
            html_escape(node.alt.as_deref().unwrap_or(""))
        ),
        "embed" => serialize_embed(node),
        other => {
            tracing::debug!("Skipping unsupported rich text block {:?}", other);
            String::new()
        }
    }
}

fn heading_level(kind: &str) -> Option<u8> {
    kind.strip_prefix("heading")
        .and_then(|n| n.parse::<u8>().ok())
        .filter(|n| (1..=6).contains(n))
}

fn serialize_embed(node: &RichTextNode) -> String {
    let oembed = node.oembed.as_ref();
    let field = |name: &str| {
        oembed
            .and_then(|o| o.get(name))
            .and_then(|v| v.as_str())
            .unwrap_or("")
    };

    format!(
        r#"<div data-oembed="{}" data-oembed-type="{}" data-oembed-provider="{}">{}</div>"#,
        html_escape(field("embed_url")),
        html_escape(field("type")),
        html_escape(field("provider_name")),
        field("html")
    )
}

/// Escaped text of a block with its spans applied
///
/// Span offsets count UTF-16 code units. Overlapping spans are closed and
/// re-opened at each boundary so the output always nests correctly.
fn serialize_spans(node: &RichTextNode) -> String {
    let mut spans: Vec<(usize, &Span)> = node
        .spans
        .iter()
        .filter(|s| s.start < s.end && open_tag(s).is_some())
        .enumerate()
        .collect();
    // Outer spans first
    spans.sort_by_key(|(i, s)| (s.start, Reverse(s.end), *i));

    let mut out = String::with_capacity(node.text.len());
    let mut open: Vec<&Span> = Vec::new();
    let mut offset = 0usize;

    for c in node.text.chars() {
        let active: Vec<&Span> = spans
            .iter()
            .map(|(_, s)| *s)
            .filter(|s| s.start <= offset && offset < s.end)
            .collect();

        if active != open {
            let common = open
                .iter()
                .zip(active.iter())
                .take_while(|(a, b)| a == b)
                .count();
            for span in open[common..].iter().rev() {
                out.push_str(close_tag(span));
            }
            for span in &active[common..] {
                out.push_str(&open_tag(span).unwrap_or_default());
            }
            open = active;
        }

        match c {
            '\n' => out.push_str("<br />"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }

        offset += c.len_utf16();
    }

    for span in open.iter().rev() {
        out.push_str(close_tag(span));
    }

    out
}

fn span_data<'a>(span: &'a Span, key: &str) -> Option<&'a str> {
    span.data
        .as_ref()
        .and_then(|d| d.get(key))
        .and_then(|v| v.as_str())
}

fn open_tag(span: &Span) -> Option<String> {
    match span.kind.as_str() {
        "strong" => Some("<strong>".to_string()),
        "em" => Some("<em>".to_string()),
        "label" => Some(format!(
            r#"<span class="{}">"#,
            html_escape(span_data(span, "label").unwrap_or(""))
        )),
        "hyperlink" => {
            let href = link_href(span);
            match span_data(span, "target") {
                Some(target) => Some(format!(
                    r#"<a href="{}" target="{}" rel="noopener noreferrer">"#,
                    html_escape(&href),
                    html_escape(target)
                )),
                None => Some(format!(r#"<a href="{}">"#, html_escape(&href))),
            }
        }
        _ => None,
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind.as_str() {
        "strong" => "</strong>",
        "em" => "</em>",
        "label" => "</span>",
        "hyperlink" => "</a>",
        _ => "",
    }
}

/// Web links keep their url; links to documents resolve to post pages
fn link_href(span: &Span) -> String {
    if let Some(url) = span_data(span, "url") {
        return url.to_string();
    }
    match span_data(span, "uid") {
        Some(uid) => post_path(uid),
        None => "#".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: usize, end: usize, kind: &str) -> Span {
        Span {
            start,
            end,
            kind: kind.to_string(),
            data: None,
        }
    }

    fn node(kind: &str, text: &str, spans: Vec<Span>) -> RichTextNode {
        RichTextNode {
            kind: kind.to_string(),
            text: text.to_string(),
            spans,
            url: None,
            alt: None,
            oembed: None,
        }
    }

    #[test]
    fn test_as_text() {
        let nodes = vec![
            RichTextNode::paragraph("Hello world"),
            RichTextNode::paragraph("again"),
        ];
        assert_eq!(as_text(&nodes), "Hello world again");
        assert_eq!(as_text(&[]), "");
    }

    #[test]
    fn test_paragraph_and_heading() {
        let nodes = vec![
            node("heading2", "Title", vec![]),
            RichTextNode::paragraph("a < b & c"),
        ];
        assert_eq!(as_html(&nodes), "<h2>Title</h2><p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn test_list_grouping() {
        let nodes = vec![
            node("list-item", "one", vec![]),
            node("list-item", "two", vec![]),
            node("o-list-item", "first", vec![]),
            RichTextNode::paragraph("end"),
        ];
        assert_eq!(
            as_html(&nodes),
            "<ul><li>one</li><li>two</li></ul><ol><li>first</li></ol><p>end</p>"
        );
    }

    #[test]
    fn test_nested_spans() {
        let n = node(
            "paragraph",
            "bold and italic",
            vec![span(0, 15, "strong"), span(9, 15, "em")],
        );
        assert_eq!(
            serialize_spans(&n),
            "<strong>bold and <em>italic</em></strong>"
        );
    }

    #[test]
    fn test_overlapping_spans_stay_well_nested() {
        let n = node("paragraph", "abcd", vec![span(0, 3, "strong"), span(1, 4, "em")]);
        assert_eq!(
            serialize_spans(&n),
            "<strong>a<em>bc</em></strong><em>d</em>"
        );
    }

    #[test]
    fn test_hyperlink() {
        let mut link = span(0, 4, "hyperlink");
        link.data = Some(serde_json::json!({
            "link_type": "Web",
            "url": "https://rocketseat.com.br",
            "target": "_blank"
        }));
        let n = node("paragraph", "site here", vec![link]);
        assert_eq!(
            serialize_spans(&n),
            r#"<a href="https://rocketseat.com.br" target="_blank" rel="noopener noreferrer">site</a> here"#
        );
    }

    #[test]
    fn test_document_link() {
        let mut link = span(0, 4, "hyperlink");
        link.data = Some(serde_json::json!({"link_type": "Document", "uid": "outro-post"}));
        let n = node("paragraph", "veja", vec![link]);
        assert_eq!(serialize_spans(&n), r#"<a href="/post/outro-post">veja</a>"#);
    }

    #[test]
    fn test_utf16_offsets() {
        // "😀" is two UTF-16 code units
        let n = node("paragraph", "😀 ok", vec![span(3, 5, "em")]);
        assert_eq!(serialize_spans(&n), "😀 <em>ok</em>");
    }

    #[test]
    fn test_line_breaks_and_image() {
        let mut image = node("image", "", vec![]);
        image.url = Some("https://images.prismic.io/a.png".to_string());
        image.alt = Some("A \"quoted\" alt".to_string());
        let nodes = vec![node("preformatted", "line1\nline2", vec![]), image];
        assert_eq!(
            as_html(&nodes),
            r#"<pre>line1<br />line2</pre><p class="block-img"><img src="https://images.prismic.io/a.png" alt="A &quot;quoted&quot; alt" /></p>"#
        );
    }

    #[test]
    fn test_unknown_block_skipped() {
        let nodes = vec![node("heading9", "nope", vec![]), node("mystery", "x", vec![])];
        assert_eq!(as_html(&nodes), "");
    }
}

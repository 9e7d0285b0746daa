//! List rendering with two authoring conventions:
//!
//! - `[text](url)` becomes a link.
//! - `Label: body` (exactly one colon, both halves non-empty, no links) becomes
//!   `<strong>Label</strong>: body`.
//!
//! Anything else renders as a single escaped unit. `check` reports items that
//! contain colons but fall through the label rule.

use super::citations::CitationIndex;
use super::escape::escape;
use crate::document::ListBlock;
use regex::Regex;
use std::sync::OnceLock;

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link regex"))
}

/// How a list item will be rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemShape<'a> {
    /// `Label: body`
    Labelled { label: &'a str, body: &'a str },
    /// Text with one or more `[text](url)` links
    Linked,
    Plain,
}

/// Classify an item under the list conventions
pub fn item_shape(item: &str) -> ItemShape<'_> {
    if link_pattern().is_match(item) {
        return ItemShape::Linked;
    }
    let mut parts = item.split(':');
    if let (Some(label), Some(body), None) = (parts.next(), parts.next(), parts.next()) {
        let (label, body) = (label.trim(), body.trim());
        if !label.is_empty() && !body.is_empty() {
            return ItemShape::Labelled { label, body };
        }
    }
    ItemShape::Plain
}

/// Escape and resolve text, turning `[text](url)` markers into anchors
fn render_inline(text: &str, citations: &CitationIndex) -> String {
    let mut out = String::with_capacity(text.len() + 32);
    let mut last = 0;
    for caps in link_pattern().captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&citations.resolve(&escape(&text[last..whole.start()])));
        out.push_str(&format!(
            "<a href=\"{}\">{}</a>",
            escape(&caps[2]),
            escape(&caps[1])
        ));
        last = whole.end();
    }
    out.push_str(&citations.resolve(&escape(&text[last..])));
    out
}

pub fn render_item(item: &str, citations: &CitationIndex) -> String {
    match item_shape(item) {
        ItemShape::Labelled { label, body } => format!(
            "<li><strong>{}</strong>: {}</li>",
            citations.resolve(&escape(label)),
            citations.resolve(&escape(body))
        ),
        ItemShape::Linked | ItemShape::Plain => {
            format!("<li>{}</li>", render_inline(item, citations))
        }
    }
}

pub fn render_list(list: &ListBlock, citations: &CitationIndex) -> String {
    let tag = list.tag();
    let items: String = list
        .items
        .iter()
        .map(|item| render_item(item, citations))
        .collect();
    format!("<{tag}>{items}</{tag}>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Reference;

    fn no_refs() -> CitationIndex {
        CitationIndex::new(&[])
    }

    fn list(kind: &str, items: &[&str]) -> ListBlock {
        ListBlock {
            list_type: kind.to_string(),
            items: items.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_label_body_item() {
        assert_eq!(
            render_item("Scope: everything in region X", &no_refs()),
            "<li><strong>Scope</strong>: everything in region X</li>"
        );
    }

    #[test]
    fn test_two_colons_render_as_one_unit() {
        assert_eq!(render_item("a:b:c", &no_refs()), "<li>a:b:c</li>");
    }

    #[test]
    fn test_empty_half_is_not_a_label() {
        assert_eq!(item_shape("Note:"), ItemShape::Plain);
        assert_eq!(item_shape(": body"), ItemShape::Plain);
        assert_eq!(render_item("Note:", &no_refs()), "<li>Note:</li>");
    }

    #[test]
    fn test_link_marker_becomes_anchor() {
        let out = render_item(
            "Read [the guide](https://example.com/a?b=1&c=2) first",
            &no_refs(),
        );
        assert_eq!(
            out,
            "<li>Read <a href=\"https://example.com/a?b=1&amp;c=2\">the guide</a> first</li>"
        );
    }

    #[test]
    fn test_link_item_with_label_is_not_split() {
        let out = render_item("Docs: [site](https://x.org)", &no_refs());
        assert!(out.starts_with("<li>Docs: <a href="));
        assert!(!out.contains("<strong>"));
    }

    #[test]
    fn test_halves_are_escaped_and_cited() {
        let refs: Vec<Reference> = serde_json::from_str(r#"[{"id": 1, "title": "R"}]"#).unwrap();
        let index = CitationIndex::new(&refs);
        let out = render_item("<Risk>: high [1]", &index);
        assert!(out.starts_with("<li><strong>&lt;Risk&gt;</strong>: high <sup"));
        assert!(out.contains("href=\"#ref-1\""));
    }

    #[test]
    fn test_list_tags() {
        let ul = render_list(&list("ul", &["one"]), &no_refs());
        let ol = render_list(&list("ol", &["one", "two"]), &no_refs());
        assert_eq!(ul, "<ul><li>one</li></ul>");
        assert_eq!(ol, "<ol><li>one</li><li>two</li></ol>");
    }
}

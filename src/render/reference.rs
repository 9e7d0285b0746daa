//! Reference list rendering

use super::error_fragment;
use super::escape::{escape, escape_opt};
use crate::document::{Block, Ident, Reference, ReferenceEntry};
use std::collections::HashSet;

fn citation_label(entry: &ReferenceEntry) -> String {
    match entry.citations.as_deref() {
        Some(numbers) if !numbers.is_empty() => {
            let joined: Vec<String> = numbers.iter().map(u64::to_string).collect();
            format!("[{}]", joined.join(", "))
        }
        _ => format!("[{}]", escape(entry.id.as_str())),
    }
}

/// Render one reference; `position` is 1-based and anchors legacy entries
pub fn render_reference(reference: &Reference, position: usize) -> String {
    match reference {
        Reference::Legacy(text) => {
            format!("<p id=\"ref-{position}\">{}</p>", escape(text))
        }
        Reference::Entry(entry) => {
            let url = escape(entry.url.as_deref().unwrap_or("#"));
            format!(
                "<p id=\"ref-{id}\"><span class=\"reference-number\">{label}</span> \
                 <a href=\"{url}\" target=\"_blank\" rel=\"noopener noreferrer\" class=\"reference-link\">{title}</a>. \
                 {description} \
                 <a href=\"{url}\" target=\"_blank\" rel=\"noopener noreferrer\" class=\"reference-url\">{url}</a></p>",
                id = escape(entry.id.as_str()),
                label = citation_label(entry),
                title = escape_opt(entry.title.as_deref()),
                description = escape_opt(entry.description.as_deref()),
            )
        }
    }
}

/// Render the whole list. A legacy entry is anchored by its position unless a
/// structured entry already owns that id; malformed entries render as inline errors.
pub fn render_reference_list(references: &[Block<Reference>]) -> String {
    let claimed: HashSet<&Ident> = references
        .iter()
        .filter_map(|r| match r {
            Ok(Reference::Entry(entry)) => Some(&entry.id),
            _ => None,
        })
        .collect();

    let items: String = references
        .iter()
        .enumerate()
        .map(|(i, r)| match r {
            Ok(Reference::Legacy(text)) if claimed.contains(&Ident::from(i as u64 + 1)) => {
                format!("<p>{}</p>", escape(text))
            }
            Ok(reference) => render_reference(reference, i + 1),
            Err(e) => {
                log::warn!("Reference {} not rendered: {}", i + 1, e);
                error_fragment(&format!("Invalid reference {}: {}", i + 1, e))
            }
        })
        .collect();
    format!("<div class=\"references-list\">{items}</div>")
}

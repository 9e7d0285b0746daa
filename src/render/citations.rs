//! Citation resolution: `[3]`, `[3,7]`, `[1-3]` markers become superscript links
//!
//! Legacy documents numbered references by position. Unified references keep
//! those numbers alive through their `citations` list, so `[3]` and `[7]` may
//! both point at the same entry. Displayed numbers never change; only the link
//! target is remapped.

use super::escape::escape;
use crate::document::{Block, Ident, Reference};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn citation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[(\d+(?:[,\s-]+\d+)*)\]").expect("valid citation regex"))
}

fn separator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[,\s-]+").expect("valid separator regex"))
}

/// One bracketed citation marker, parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationGroup {
    /// Numbers as written, in order, duplicates kept
    pub numbers: Vec<u64>,
    /// Canonical reference id for each entry of `numbers`
    pub targets: Vec<Ident>,
}

impl CitationGroup {
    /// Canonical targets with duplicates removed, first occurrence first
    pub fn unique_targets(&self) -> Vec<&Ident> {
        let mut seen = Vec::new();
        for t in &self.targets {
            if !seen.contains(&t) {
                seen.push(t);
            }
        }
        seen
    }
}

/// Lookup tables built once per reference list
#[derive(Debug, Clone, Default)]
pub struct CitationIndex {
    /// legacy number -> canonical id
    legacy: HashMap<u64, Ident>,
    /// canonical id -> tooltip text
    titles: HashMap<Ident, String>,
    empty: bool,
}

impl CitationIndex {
    pub fn new(references: &[Reference]) -> Self {
        Self::build(references.iter().enumerate(), references.is_empty())
    }

    /// Index over a loaded document's references; malformed entries keep their
    /// position but contribute nothing
    pub fn for_document(references: &[Block<Reference>]) -> Self {
        let valid = references
            .iter()
            .enumerate()
            .filter_map(|(pos, r)| r.as_ref().ok().map(|r| (pos, r)));
        Self::build(valid, references.is_empty())
    }

    fn build<'r>(references: impl Iterator<Item = (usize, &'r Reference)>, empty: bool) -> Self {
        let mut legacy = HashMap::new();
        let mut titles = HashMap::new();

        for (pos, reference) in references {
            match reference {
                Reference::Entry(entry) => {
                    match &entry.citations {
                        Some(numbers) => {
                            for n in numbers {
                                legacy.insert(*n, entry.id.clone());
                            }
                        }
                        None => {
                            if let Some(n) = entry.id.as_number() {
                                legacy.insert(n, entry.id.clone());
                            }
                        }
                    }
                    let title = entry
                        .title
                        .as_deref()
                        .filter(|t| !t.is_empty())
                        .or(entry.description.as_deref())
                        .unwrap_or_default();
                    titles.insert(entry.id.clone(), title.to_string());
                }
                Reference::Legacy(text) => {
                    titles
                        .entry(Ident::from(pos as u64 + 1))
                        .or_insert_with(|| text.clone());
                }
            }
        }

        Self {
            legacy,
            titles,
            empty,
        }
    }

    /// Canonical id for a citation number; unmapped numbers stand for themselves
    pub fn target(&self, number: u64) -> Ident {
        self.legacy
            .get(&number)
            .cloned()
            .unwrap_or_else(|| Ident::from(number))
    }

    /// Tooltip for a canonical id, when the id names a known reference
    pub fn title(&self, id: &Ident) -> Option<&str> {
        self.titles.get(id).map(String::as_str)
    }

    /// Parse the inside of one `[...]` marker
    pub fn parse_group(&self, inner: &str) -> CitationGroup {
        let numbers: Vec<u64> = separator_pattern()
            .split(inner)
            .filter_map(|tok| tok.trim().parse().ok())
            .collect();
        let targets = numbers.iter().map(|n| self.target(*n)).collect();
        CitationGroup { numbers, targets }
    }

    /// Every citation group in `text`, in order
    pub fn groups(&self, text: &str) -> Vec<CitationGroup> {
        citation_pattern()
            .captures_iter(text)
            .map(|caps| self.parse_group(&caps[1]))
            .collect()
    }

    /// Rewrite citation markers in already-escaped `html` into links
    pub fn resolve(&self, html: &str) -> String {
        if self.empty {
            return html.to_string();
        }
        citation_pattern()
            .replace_all(html, |caps: &regex::Captures| {
                let group = self.parse_group(&caps[1]);
                if group.numbers.is_empty() {
                    caps[0].to_string()
                } else {
                    self.render_group(&group)
                }
            })
            .into_owned()
    }

    fn render_group(&self, group: &CitationGroup) -> String {
        let links: Vec<String> = group
            .numbers
            .iter()
            .zip(&group.targets)
            .map(|(n, id)| {
                let id_attr = escape(id.as_str());
                let title = self
                    .title(id)
                    .map(|t| format!(" title=\"{}\"", escape(t)))
                    .unwrap_or_default();
                format!(
                    "<a href=\"#ref-{id_attr}\" class=\"citation-link\" data-ref=\"ref-{id_attr}\"{title}>{n}</a>"
                )
            })
            .collect();
        format!("<sup class=\"citation\">[{}]</sup>", links.join(", "))
    }
}

/// Resolve citations in `text` against `references` (builds a throwaway index)
pub fn resolve_citations(text: &str, references: &[Reference]) -> String {
    CitationIndex::new(references).resolve(text)
}

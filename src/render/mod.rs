//! HTML rendering: block renderers, the section composer and the report assembler

pub mod chart;
pub mod citations;
pub mod escape;
pub mod heatmap;
pub mod list;
pub mod page;
pub mod reference;
pub mod report;
pub mod section;
pub mod table;

pub use citations::{resolve_citations, CitationIndex};
pub use escape::escape;
pub use report::{RenderOptions, RenderedReport, ReportRenderer};

use serde_json::Value;

/// Rendered HTML plus the blocks that still need a mount step
#[derive(Debug, Clone, Default)]
pub struct Fragment {
    pub html: String,
    pub mounts: Vec<Mount>,
}

impl Fragment {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            mounts: Vec::new(),
        }
    }

    pub fn push_str(&mut self, html: &str) {
        self.html.push_str(html);
    }

    pub fn append(&mut self, other: Fragment) {
        self.html.push_str(&other.html);
        self.mounts.extend(other.mounts);
    }
}

/// A placeholder waiting for its content, identified by its element id
#[derive(Debug, Clone, PartialEq)]
pub enum Mount {
    /// Chart.js initialisation, carried to the page runtime
    Chart { id: String, config: Value },
    /// Heatmap grid, filled in by the assembler
    Heatmap { id: String },
}

impl Mount {
    pub fn id(&self) -> &str {
        match self {
            Mount::Chart { id, .. } | Mount::Heatmap { id } => id,
        }
    }
}

/// Allocates element ids that are unique within one report and stable across renders
#[derive(Debug, Clone)]
pub struct ElementIds {
    scope: String,
    next: usize,
}

impl ElementIds {
    /// `scope` must be unique per concurrently rendered unit (the section position)
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            next: 0,
        }
    }

    pub fn next(&mut self, kind: &str) -> String {
        self.next += 1;
        format!("{}-{}-{}", kind, self.scope, self.next)
    }
}

/// Visible inline error used when one block cannot render
pub fn error_fragment(message: &str) -> String {
    format!(
        "<p class=\"render-error\" style=\"color: red;\">{}</p>",
        escape(message)
    )
}

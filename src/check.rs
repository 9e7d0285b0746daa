//! Authoring diagnostics
//!
//! Rendering never fails on questionable content; it degrades or guesses.
//! `Checker` reports the places where it had to: list items whose colons do not
//! produce a label, comment cells inserted as raw markup, malformed blocks,
//! table files that cannot be read, unknown heatmap statuses and citations that
//! point at no reference.

use crate::document::{
    ListBlock, ReportDocument, Section, SectionBody, TableBlock, TableSource,
};
use crate::heatmap::{Coverage, HeatmapConfig};
use crate::render::citations::CitationIndex;
use crate::render::list::{item_shape, ItemShape};
use crate::render::table::is_trusted_comment;
use crate::source::{fetch_json, ContentSource};
use serde::Serialize;
use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// What a diagnostic is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    AmbiguousListItem,
    TrustedMarkup,
    RowArity,
    InvalidBlock,
    TableFileUnavailable,
    UnknownCoverage,
    UnresolvedCitation,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckKind::AmbiguousListItem => "ambiguous-list-item",
            CheckKind::TrustedMarkup => "trusted-markup",
            CheckKind::RowArity => "row-arity",
            CheckKind::InvalidBlock => "invalid-block",
            CheckKind::TableFileUnavailable => "table-file-unavailable",
            CheckKind::UnknownCoverage => "unknown-coverage",
            CheckKind::UnresolvedCitation => "unresolved-citation",
        };
        f.write_str(name)
    }
}

impl CheckKind {
    pub fn severity(self) -> Severity {
        match self {
            CheckKind::RowArity | CheckKind::InvalidBlock | CheckKind::TableFileUnavailable => {
                Severity::Error
            }
            CheckKind::UnknownCoverage | CheckKind::UnresolvedCitation => Severity::Warning,
            CheckKind::AmbiguousListItem | CheckKind::TrustedMarkup => Severity::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub kind: CheckKind,
    pub severity: Severity,
    /// Where in the document, e.g. `section 3 > table "Results" row 2`
    pub location: String,
    pub message: String,
}

/// All diagnostics for one content document
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub content: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckReport {
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }
}

pub struct Checker<'a> {
    source: &'a dyn ContentSource,
    heatmap: &'a HeatmapConfig,
}

impl<'a> Checker<'a> {
    pub fn new(source: &'a dyn ContentSource, heatmap: &'a HeatmapConfig) -> Self {
        Self { source, heatmap }
    }

    pub fn check(&self, doc: &ReportDocument) -> Vec<Diagnostic> {
        let mut run = Run {
            citations: CitationIndex::for_document(&doc.references),
            has_references: !doc.references.is_empty(),
            diagnostics: Vec::new(),
        };

        for (i, reference) in doc.references.iter().enumerate() {
            if let Err(e) = reference {
                run.push(CheckKind::InvalidBlock, &format!("reference {}", i + 1), e.to_string());
            }
        }

        run.text("abstract", &doc.abstract_text);
        for section in &doc.sections {
            self.section(&mut run, section);
        }

        let has_heatmap = doc.sections.iter().any(|s| {
            s.body.heatmap.is_some() || s.subsections.iter().any(|sub| sub.body.heatmap.is_some())
        });
        if has_heatmap {
            self.heatmap_categories(&mut run);
        }

        run.diagnostics
    }

    fn section(&self, run: &mut Run, section: &Section) {
        let location = format!("section {}", section.number);
        self.body(run, &location, &section.body);
        for sub in &section.subsections {
            self.body(run, &format!("{location} > {}", sub.number), &sub.body);
        }
    }

    fn body(&self, run: &mut Run, location: &str, body: &SectionBody) {
        for p in body.paragraphs.iter().chain(&body.paragraphs_after) {
            run.text(location, p);
        }
        for list in &body.lists {
            match list {
                Ok(list) => run.list(location, list),
                Err(e) => run.push(CheckKind::InvalidBlock, location, e.to_string()),
            }
        }
        for table in &body.tables {
            match table {
                Ok(TableSource::Inline(table)) => run.table(location, table),
                Ok(TableSource::File(path)) => match fetch_json::<TableBlock>(self.source, path) {
                    Ok(table) => run.table(&format!("{location} > {}", path.display()), &table),
                    Err(e) => run.push(CheckKind::TableFileUnavailable, location, e.to_string()),
                },
                Err(e) => run.push(CheckKind::InvalidBlock, location, e.to_string()),
            }
        }
        let blocks = [
            body.chart.as_ref().and_then(|c| c.as_ref().err()),
            body.heatmap.as_ref().and_then(|h| h.as_ref().err()),
        ];
        for e in blocks.into_iter().flatten() {
            run.push(CheckKind::InvalidBlock, location, e.to_string());
        }
    }

    fn heatmap_categories(&self, run: &mut Run) {
        for category in &self.heatmap.categories {
            let location = format!("heatmap {}", category.id);
            let table = match fetch_json::<TableBlock>(self.source, &category.table_file) {
                Ok(table) => table,
                Err(e) => {
                    run.push(CheckKind::TableFileUnavailable, &location, e.to_string());
                    continue;
                }
            };
            for (i, row) in table.rows.iter().enumerate() {
                let status = row.get(1).map(String::as_str).unwrap_or_default();
                if Coverage::parse(status).is_none() {
                    run.push(
                        CheckKind::UnknownCoverage,
                        &format!("{location} row {}", i + 1),
                        format!("Coverage \"{status}\" is not a known status; shown as Not Tested"),
                    );
                }
            }
        }
    }
}

/// Per-check state
struct Run {
    citations: CitationIndex,
    has_references: bool,
    diagnostics: Vec<Diagnostic>,
}

impl Run {
    fn push(&mut self, kind: CheckKind, location: &str, message: String) {
        self.diagnostics.push(Diagnostic {
            kind,
            severity: kind.severity(),
            location: location.to_string(),
            message,
        });
    }

    fn text(&mut self, location: &str, text: &str) {
        if !self.has_references {
            return;
        }
        let mut missing = Vec::new();
        for group in self.citations.groups(text) {
            for (n, target) in group.numbers.iter().zip(&group.targets) {
                if self.citations.title(target).is_none() && !missing.contains(n) {
                    missing.push(*n);
                }
            }
        }
        for n in missing {
            self.push(
                CheckKind::UnresolvedCitation,
                location,
                format!("Citation [{n}] does not match any reference"),
            );
        }
    }

    fn list(&mut self, location: &str, list: &ListBlock) {
        for (i, item) in list.items.iter().enumerate() {
            self.text(location, item);
            let colons = item.matches(':').count();
            if colons == 0 || !matches!(item_shape(item), ItemShape::Plain | ItemShape::Linked) {
                continue;
            }
            let reason = match item_shape(item) {
                ItemShape::Linked => "contains a link",
                _ if colons > 1 => "has more than one colon",
                _ => "has an empty label or body",
            };
            self.push(
                CheckKind::AmbiguousListItem,
                &format!("{location} > list item {}", i + 1),
                format!("Item has a colon but {reason}, so no label is rendered"),
            );
        }
    }

    fn table(&mut self, location: &str, table: &TableBlock) {
        let location = format!("{location} > table \"{}\"", table.caption);
        if let Some((row, found)) = table.first_arity_mismatch() {
            self.push(
                CheckKind::RowArity,
                &location,
                format!(
                    "Row {} has {} cells, expected {}; the table renders as an error",
                    row + 1,
                    found,
                    table.headers.len()
                ),
            );
        }
        for (i, row) in table.rows.iter().enumerate() {
            for cell in row {
                self.text(&location, cell);
            }
            if row.last().is_some_and(|c| is_trusted_comment(c)) {
                self.push(
                    CheckKind::TrustedMarkup,
                    &format!("{location} row {}", i + 1),
                    "Last cell contains <strong> and is inserted as raw HTML".to_string(),
                );
            }
        }
        if let Some(note) = &table.note {
            self.text(&location, note);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heatmap::CategorySpec;
    use crate::source::FsSource;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn run_check(json: &str, dir: &TempDir, heatmap: &HeatmapConfig) -> Vec<Diagnostic> {
        let doc = ReportDocument::from_json_str(json).unwrap();
        let source = FsSource::new(dir.path());
        Checker::new(&source, heatmap).check(&doc)
    }

    fn kinds(diagnostics: &[Diagnostic]) -> Vec<CheckKind> {
        diagnostics.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn test_clean_document_has_no_diagnostics() {
        let dir = TempDir::new().unwrap();
        let diagnostics = run_check(
            r#"{"abstract": "See [1].", "sections": [{"number": 1, "title": "A",
                "lists": [{"type": "ul", "items": ["Scope: web app", "plain"]}]}],
                "references": [{"id": 1, "title": "R"}]}"#,
            &dir,
            &HeatmapConfig::default(),
        );
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    #[test]
    fn test_ambiguous_list_items() {
        let dir = TempDir::new().unwrap();
        let diagnostics = run_check(
            r#"{"sections": [{"number": 1, "title": "A", "lists": [{"type": "ul", "items": [
                "Time: 10:30",
                "Docs: [site](https://example.com)",
                "Trailing:",
                "Fine: yes"
            ]}]}]}"#,
            &dir,
            &HeatmapConfig::default(),
        );
        assert_eq!(kinds(&diagnostics), vec![CheckKind::AmbiguousListItem; 3]);
        assert!(diagnostics[0].message.contains("more than one colon"));
        assert!(diagnostics[1].message.contains("link"));
        assert!(diagnostics[2].message.contains("empty"));
        assert_eq!(diagnostics[0].location, "section 1 > list item 1");
    }

    #[test]
    fn test_table_checks() {
        let dir = TempDir::new().unwrap();
        let diagnostics = run_check(
            r#"{"sections": [{"number": 2, "title": "T",
                "table": {"caption": "Bad", "headers": ["a", "b"], "rows": [["1", "<strong>x</strong>"], ["only"]]},
                "tableFile": "missing.json"}]}"#,
            &dir,
            &HeatmapConfig::default(),
        );
        let found = kinds(&diagnostics);
        assert!(found.contains(&CheckKind::RowArity));
        assert!(found.contains(&CheckKind::TrustedMarkup));
        assert!(found.contains(&CheckKind::TableFileUnavailable));
    }

    #[test]
    fn test_unresolved_citation_is_reported_once() {
        let dir = TempDir::new().unwrap();
        let diagnostics = run_check(
            r#"{"abstract": "[1] [9] [9, 1]", "sections": [],
                "references": [{"id": 1, "title": "R"}]}"#,
            &dir,
            &HeatmapConfig::default(),
        );
        assert_eq!(kinds(&diagnostics), vec![CheckKind::UnresolvedCitation]);
        assert!(diagnostics[0].message.contains("[9]"));
        assert_eq!(diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn test_malformed_reference_is_reported_by_position() {
        let dir = TempDir::new().unwrap();
        let diagnostics = run_check(
            r#"{"abstract": "[1] [3]", "sections": [],
                "references": ["One", {"title": "No id"}, "Three"]}"#,
            &dir,
            &HeatmapConfig::default(),
        );
        assert_eq!(kinds(&diagnostics), vec![CheckKind::InvalidBlock]);
        assert_eq!(diagnostics[0].location, "reference 2");
    }

    #[test]
    fn test_unknown_coverage_only_checked_with_heatmap() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.json"),
            r#"{"caption": "A", "headers": ["CWE", "Coverage", "Comments"],
                "rows": [["CWE-1", "Covered", ""], ["CWE-2", "Mostly", ""]]}"#,
        )
        .unwrap();
        let heatmap = HeatmapConfig {
            categories: vec![CategorySpec {
                id: "A01".into(),
                title: "One".into(),
                table_file: PathBuf::from("a.json"),
            }],
            ..HeatmapConfig::default()
        };

        let without = run_check(r#"{"sections": [{"number": 1, "title": "A"}]}"#, &dir, &heatmap);
        assert!(without.is_empty());

        let with = run_check(
            r#"{"sections": [{"number": 1, "title": "A", "heatmap": true}]}"#,
            &dir,
            &heatmap,
        );
        assert_eq!(kinds(&with), vec![CheckKind::UnknownCoverage]);
        assert_eq!(with[0].location, "heatmap A01 row 2");
    }

    #[test]
    fn test_report_counts() {
        let report = CheckReport {
            content: "content.json".into(),
            diagnostics: vec![Diagnostic {
                kind: CheckKind::RowArity,
                severity: Severity::Error,
                location: "section 1".into(),
                message: "m".into(),
            }],
        };
        assert!(report.has_errors());
        assert_eq!(report.count(Severity::Warning), 0);
    }
}

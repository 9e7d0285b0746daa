//! Content document loading and load-time block resolution
//!
//! Authors describe a section as a bag of optional fields (`table`, `tableFile`,
//! `tables`, `tableFiles`, `chart`, ...). Those fields are resolved once, here,
//! into typed blocks; a field that does not match its schema becomes an
//! `Err(ReportError::InvalidBlock)` entry that the renderer turns into an inline
//! error fragment.

mod schema;

pub use schema::{
    ChartDescriptor, HeatmapDescriptor, Ident, ListBlock, Metadata, RawDocument, RawSection,
    Reference, ReferenceEntry, TableBlock,
};

use crate::error::{ReportError, Result};
use crate::source::{fetch_json, ContentSource};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONTENT_FILE: &str = "content.json";

/// A block after resolution: either ready to render, or the reason it is not
pub type Block<T> = std::result::Result<T, ReportError>;

/// Where a table's data lives
#[derive(Debug, Clone)]
pub enum TableSource {
    Inline(TableBlock),
    File(PathBuf),
}

/// Blocks shared by sections and subsections, in declaration form
#[derive(Debug, Default)]
pub struct SectionBody {
    pub paragraphs: Vec<String>,
    pub lists: Vec<Block<ListBlock>>,
    /// Literal table, then table file, then table array, then table-file array
    pub tables: Vec<Block<TableSource>>,
    pub chart: Option<Block<ChartDescriptor>>,
    pub heatmap: Option<Block<HeatmapDescriptor>>,
    pub paragraphs_after: Vec<String>,
}

impl SectionBody {
    /// Whether this body carries a block that needs the full page width
    pub fn has_wide_blocks(&self) -> bool {
        !self.tables.is_empty() || self.chart.is_some() || self.heatmap.is_some()
    }
}

#[derive(Debug)]
pub struct Subsection {
    pub number: Ident,
    pub title: String,
    pub body: SectionBody,
}

#[derive(Debug)]
pub struct Section {
    pub number: Ident,
    pub title: String,
    pub body: SectionBody,
    pub subsections: Vec<Subsection>,
    /// Renders the reference list inline
    pub references: bool,
    pub wide: bool,
}

/// The loaded report, immutable after load
#[derive(Debug)]
pub struct ReportDocument {
    pub metadata: Metadata,
    pub abstract_text: String,
    pub sections: Vec<Section>,
    /// In document order; a malformed entry keeps its position as an error
    pub references: Vec<Block<Reference>>,
}

impl ReportDocument {
    /// Fetch `path` from `source` and resolve it
    pub fn load(source: &dyn ContentSource, path: &Path) -> Result<Self> {
        let raw: RawDocument = fetch_json(source, path)?;
        Ok(Self::from_raw(raw))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawDocument =
            serde_json::from_str(json).map_err(|source| ReportError::Parse {
                path: PathBuf::from(DEFAULT_CONTENT_FILE),
                source,
            })?;
        Ok(Self::from_raw(raw))
    }

    pub fn from_raw(raw: RawDocument) -> Self {
        let sections = raw
            .sections
            .into_iter()
            .map(|s| {
                let body = resolve_body(&s);
                let subsections = s
                    .subsections
                    .iter()
                    .map(|sub| Subsection {
                        number: sub.number.clone(),
                        title: sub.title.clone(),
                        body: resolve_body(sub),
                    })
                    .collect();
                Section {
                    number: s.number,
                    title: s.title,
                    body,
                    subsections,
                    references: s.references,
                    wide: s.wide,
                }
            })
            .collect();

        Self {
            metadata: raw.metadata,
            abstract_text: raw.abstract_text,
            sections,
            references: raw.references.iter().map(resolve_reference).collect(),
        }
    }
}

fn resolve_body(raw: &RawSection) -> SectionBody {
    let lists = match &raw.lists {
        None => vec![],
        Some(Value::Array(items)) => items.iter().map(|v| parse_block("list", v)).collect(),
        Some(_) => vec![Err(invalid("list", "\"lists\" must be an array"))],
    };

    let mut tables = Vec::new();
    if let Some(v) = &raw.table {
        tables.push(parse_block("table", v).map(TableSource::Inline));
    }
    if let Some(v) = &raw.table_file {
        tables.push(parse_path(v).map(TableSource::File));
    }
    match &raw.tables {
        None => {}
        Some(Value::Array(items)) => {
            tables.extend(
                items
                    .iter()
                    .map(|v| parse_block("table", v).map(TableSource::Inline)),
            );
        }
        Some(_) => tables.push(Err(invalid("table", "\"tables\" must be an array"))),
    }
    match &raw.table_files {
        None => {}
        Some(Value::Array(items)) => {
            tables.extend(items.iter().map(|v| parse_path(v).map(TableSource::File)));
        }
        Some(_) => tables.push(Err(invalid("table", "\"tableFiles\" must be an array"))),
    }

    let heatmap = raw.heatmap.as_ref().map(|v| match v {
        Value::Bool(true) => Ok(HeatmapDescriptor::default()),
        other => parse_block("heatmap", other),
    });

    SectionBody {
        paragraphs: raw.paragraphs.clone(),
        lists,
        tables,
        chart: raw.chart.as_ref().map(|v| parse_block("chart", v)),
        heatmap,
        paragraphs_after: raw.paragraphs_after.clone(),
    }
}

fn resolve_reference(value: &Value) -> Block<Reference> {
    match value {
        Value::String(text) => Ok(Reference::Legacy(text.clone())),
        Value::Object(_) => parse_block("reference", value).map(Reference::Entry),
        _ => Err(invalid("reference", "a reference must be a string or an object")),
    }
}

fn parse_block<T: DeserializeOwned>(kind: &'static str, value: &Value) -> Block<T> {
    T::deserialize(value).map_err(|e| invalid(kind, e))
}

fn parse_path(value: &Value) -> Block<PathBuf> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(PathBuf::from(s)),
        _ => Err(invalid("table", "table file must be a non-empty path string")),
    }
}

fn invalid(kind: &'static str, message: impl ToString) -> ReportError {
    ReportError::InvalidBlock {
        kind,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(json: &str) -> ReportDocument {
        ReportDocument::from_json_str(json).unwrap()
    }

    #[test]
    fn test_table_sources_resolve_in_layout_order() {
        let d = doc(r#"{
            "sections": [{
                "number": 3,
                "title": "Results",
                "tableFiles": ["tables/b.json", "tables/c.json"],
                "tables": [{"caption": "Lit 2", "headers": ["x"], "rows": [["1"]]}],
                "tableFile": "tables/a.json",
                "table": {"caption": "Lit 1", "headers": ["x"], "rows": [["1"]]}
            }]
        }"#);
        let tables = &d.sections[0].body.tables;
        assert_eq!(tables.len(), 5);
        assert!(matches!(&tables[0], Ok(TableSource::Inline(t)) if t.caption == "Lit 1"));
        assert!(matches!(&tables[1], Ok(TableSource::File(p)) if p == Path::new("tables/a.json")));
        assert!(matches!(&tables[2], Ok(TableSource::Inline(t)) if t.caption == "Lit 2"));
        assert!(matches!(&tables[3], Ok(TableSource::File(p)) if p == Path::new("tables/b.json")));
        assert!(matches!(&tables[4], Ok(TableSource::File(p)) if p == Path::new("tables/c.json")));
    }

    #[test]
    fn test_malformed_block_is_contained() {
        let d = doc(r#"{
            "sections": [{
                "number": 1,
                "title": "Intro",
                "lists": [{"type": "ul", "items": ["ok"]}, {"type": "ul"}],
                "chart": "not a chart"
            }]
        }"#);
        let body = &d.sections[0].body;
        assert!(body.lists[0].is_ok());
        assert!(matches!(
            body.lists[1],
            Err(ReportError::InvalidBlock { kind: "list", .. })
        ));
        assert!(matches!(
            body.chart,
            Some(Err(ReportError::InvalidBlock { kind: "chart", .. }))
        ));
    }

    #[test]
    fn test_heatmap_true_is_default_descriptor() {
        let d = doc(r#"{"sections": [{"number": 2, "title": "Map", "heatmap": true}]}"#);
        let heatmap = d.sections[0].body.heatmap.as_ref().unwrap();
        assert!(heatmap.as_ref().unwrap().caption.is_none());
    }

    #[test]
    fn test_subsections_resolve_their_own_blocks() {
        let d = doc(r#"{
            "sections": [{
                "number": 4,
                "title": "Details",
                "subsections": [
                    {"number": "4.1", "title": "A", "tableFile": "tables/x.json"},
                    {"number": "4.2", "title": "B", "paragraphs": ["text"]}
                ]
            }]
        }"#);
        let s = &d.sections[0];
        assert!(!s.body.has_wide_blocks());
        assert!(s.subsections[0].body.has_wide_blocks());
        assert!(!s.subsections[1].body.has_wide_blocks());
        assert_eq!(s.subsections[0].number.as_str(), "4.1");
    }

    #[test]
    fn test_malformed_reference_is_contained() {
        let d = doc(r#"{
            "sections": [],
            "references": [
                "Legacy",
                {"title": "No id", "url": "https://x"},
                {"id": 1, "citations": [3, -1]},
                42
            ]
        }"#);
        assert_eq!(d.references.len(), 4);
        assert!(matches!(d.references[0], Ok(Reference::Legacy(_))));
        assert!(matches!(
            d.references[1],
            Err(ReportError::InvalidBlock { kind: "reference", .. })
        ));
        match &d.references[2] {
            Ok(Reference::Entry(e)) => assert_eq!(e.citations, Some(vec![3])),
            other => panic!("expected structured reference, got {other:?}"),
        }
        assert!(d.references[3].is_err());
    }

    #[test]
    fn test_missing_sections_is_parse_error() {
        let err = ReportDocument::from_json_str(r#"{"metadata": {}}"#).unwrap_err();
        assert!(matches!(err, ReportError::Parse { .. }));
    }
}

//! Content document schema and deserialization

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

/// Identifier that authors write either as a JSON number or a string
/// (`"number": 3`, `"number": "3.1"`, `"id": 12`, `"id": "owasp"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Ident(String);

impl Ident {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier as a citation number, when it is one
    pub fn as_number(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for Ident {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for Ident {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Int(i64),
            Float(f64),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Text(s) => Ident(s),
            Repr::Int(n) => Ident(n.to_string()),
            Repr::Float(f) => Ident(f.to_string()),
        })
    }
}

/// Report metadata shown in the header and footer
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub affiliation: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub region: Option<String>,
}

/// A bibliography entry: legacy plain text, or a structured reference that
/// may absorb several legacy citation numbers
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    Legacy(String),
    Entry(ReferenceEntry),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceEntry {
    pub id: Ident,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Legacy citation numbers that now point at this entry. Entries that are
    /// not non-negative integers are dropped.
    #[serde(default, deserialize_with = "lenient_numbers")]
    pub citations: Option<Vec<u64>>,
}

fn lenient_numbers<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u64>>, D::Error> {
    let values: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(values.map(|values| {
        values
            .iter()
            .filter_map(|v| match v {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .collect()
    }))
}

/// `{ type: "ul" | "ol", items: [...] }`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBlock {
    #[serde(rename = "type", default)]
    pub list_type: String,
    pub items: Vec<String>,
}

impl ListBlock {
    /// `ul` renders unordered; every other value renders ordered
    pub fn tag(&self) -> &'static str {
        if self.list_type == "ul" {
            "ul"
        } else {
            "ol"
        }
    }
}

/// A captioned table, inline in the document or stored in its own file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableBlock {
    #[serde(default)]
    pub caption: String,
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    /// 0-based indexes of rows drawn with a divider
    #[serde(default)]
    pub separator_rows: Vec<usize>,
}

impl TableBlock {
    /// First row whose cell count differs from the header count
    pub fn first_arity_mismatch(&self) -> Option<(usize, usize)> {
        self.rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.headers.len())
            .map(|(i, row)| (i, row.len()))
    }
}

/// Chart.js descriptor; `labels`, `datasets` and `options` pass through untouched
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDescriptor {
    #[serde(rename = "type", default = "default_chart_type")]
    pub chart_type: String,
    #[serde(default)]
    pub labels: Vec<Value>,
    #[serde(default)]
    pub datasets: Vec<Value>,
    #[serde(default)]
    pub options: Option<Value>,
    #[serde(default)]
    pub show_legend: Option<bool>,
    #[serde(default)]
    pub caption: Option<String>,
}

fn default_chart_type() -> String {
    "line".to_string()
}

/// Heatmap trigger; the grid itself comes from the configured category files
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapDescriptor {
    #[serde(default)]
    pub caption: Option<String>,
}

/// Section as written by authors. Block fields stay as raw JSON until load-time
/// resolution so that one malformed block cannot fail the whole document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSection {
    #[serde(default)]
    pub number: Ident,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub paragraphs_after: Vec<String>,
    #[serde(default)]
    pub lists: Option<Value>,
    #[serde(default)]
    pub subsections: Vec<RawSection>,
    #[serde(default)]
    pub table: Option<Value>,
    #[serde(default)]
    pub tables: Option<Value>,
    #[serde(default)]
    pub table_file: Option<Value>,
    #[serde(default)]
    pub table_files: Option<Value>,
    #[serde(default)]
    pub chart: Option<Value>,
    #[serde(default)]
    pub heatmap: Option<Value>,
    #[serde(default)]
    pub references: bool,
    #[serde(default)]
    pub wide: bool,
}

/// The whole content document as written by authors
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    pub sections: Vec<RawSection>,
    /// Resolved entry by entry, so one malformed reference stays contained
    #[serde(default)]
    pub references: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ident_accepts_numbers_and_strings() {
        let a: Ident = serde_json::from_str("3").unwrap();
        let b: Ident = serde_json::from_str("\"3.1\"").unwrap();
        assert_eq!(a.as_str(), "3");
        assert_eq!(a.as_number(), Some(3));
        assert_eq!(b.as_str(), "3.1");
        assert_eq!(b.as_number(), None);
    }

    #[test]
    fn test_reference_variants() {
        let refs: Vec<Reference> = serde_json::from_str(
            r#"[
                "Plain legacy reference",
                { "id": 4, "title": "OWASP", "url": "https://owasp.org", "citations": [3, 7] },
                { "id": "nist" }
            ]"#,
        )
        .unwrap();
        assert!(matches!(refs[0], Reference::Legacy(_)));
        match &refs[1] {
            Reference::Entry(e) => {
                assert_eq!(e.id.as_str(), "4");
                assert_eq!(e.citations.as_deref(), Some(&[3, 7][..]));
            }
            _ => panic!("expected structured reference"),
        }
        match &refs[2] {
            Reference::Entry(e) => assert!(e.citations.is_none()),
            _ => panic!("expected structured reference"),
        }
    }

    #[test]
    fn test_citations_drop_invalid_numbers() {
        let entry: ReferenceEntry =
            serde_json::from_str(r#"{"id": 1, "citations": [3, -1, "7", "x", 2.5]}"#).unwrap();
        assert_eq!(entry.citations, Some(vec![3, 7]));
    }

    #[test]
    fn test_list_tag() {
        let ul: ListBlock = serde_json::from_str(r#"{"type": "ul", "items": []}"#).unwrap();
        let ol: ListBlock = serde_json::from_str(r#"{"type": "ol", "items": []}"#).unwrap();
        let other: ListBlock = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert_eq!(ul.tag(), "ul");
        assert_eq!(ol.tag(), "ol");
        assert_eq!(other.tag(), "ol");
    }

    #[test]
    fn test_table_arity_mismatch() {
        let t: TableBlock = serde_json::from_str(
            r#"{"caption": "T", "headers": ["a", "b"], "rows": [["1", "2"], ["3"]]}"#,
        )
        .unwrap();
        assert_eq!(t.first_arity_mismatch(), Some((1, 1)));
    }

    #[test]
    fn test_chart_defaults_to_line() {
        let c: ChartDescriptor = serde_json::from_str(r#"{"labels": ["Q1"]}"#).unwrap();
        assert_eq!(c.chart_type, "line");
        assert!(c.show_legend.is_none());
    }
}

//! Coverage heatmap data: category configuration, coverage statuses and the
//! loader that turns category table files into grid rows

use crate::document::TableBlock;
use crate::source::{fetch_json, ContentSource};
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Coverage status of one weakness entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coverage {
    Covered,
    Partial,
    NotCovered,
    NotTested,
}

impl Coverage {
    pub const ALL: [Coverage; 4] = [
        Coverage::Covered,
        Coverage::Partial,
        Coverage::NotCovered,
        Coverage::NotTested,
    ];

    /// Parse a status cell exactly as written; anything else is `None`
    pub fn parse(status: &str) -> Option<Self> {
        match status {
            "Covered" => Some(Coverage::Covered),
            "Partial" => Some(Coverage::Partial),
            "Not Covered" => Some(Coverage::NotCovered),
            "Not Tested" => Some(Coverage::NotTested),
            _ => None,
        }
    }

    /// Parse a status cell, treating unknown statuses as not tested
    pub fn from_status(status: &str) -> Self {
        Self::parse(status).unwrap_or(Coverage::NotTested)
    }

    pub fn label(self) -> &'static str {
        match self {
            Coverage::Covered => "Covered",
            Coverage::Partial => "Partial",
            Coverage::NotCovered => "Not Covered",
            Coverage::NotTested => "Not Tested",
        }
    }
}

impl std::fmt::Display for Coverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Cell colours per coverage status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoverageColors {
    pub covered: String,
    pub partial: String,
    pub not_covered: String,
    pub not_tested: String,
}

impl Default for CoverageColors {
    fn default() -> Self {
        Self {
            covered: "#4CAF50".to_string(),
            partial: "#FFC107".to_string(),
            not_covered: "#FF9800".to_string(),
            not_tested: "#9E9E9E".to_string(),
        }
    }
}

impl CoverageColors {
    pub fn color(&self, coverage: Coverage) -> &str {
        match coverage {
            Coverage::Covered => &self.covered,
            Coverage::Partial => &self.partial,
            Coverage::NotCovered => &self.not_covered,
            Coverage::NotTested => &self.not_tested,
        }
    }
}

/// One heatmap row: a classification bucket backed by its own table file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpec {
    pub id: String,
    pub title: String,
    pub table_file: PathBuf,
}

impl CategorySpec {
    fn new(id: &str, title: &str, table_file: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            table_file: PathBuf::from(table_file),
        }
    }
}

/// Heatmap configuration passed into the loader and renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeatmapConfig {
    pub categories: Vec<CategorySpec>,
    pub colors: CoverageColors,
}

impl Default for HeatmapConfig {
    /// OWASP Top 10 (2025) categories
    fn default() -> Self {
        Self {
            categories: vec![
                CategorySpec::new("A01", "Broken Access Control", "tables/table-3a-a01-broken-access-control.json"),
                CategorySpec::new("A02", "Security Misconfiguration", "tables/table-3b-a02-security-misconfiguration.json"),
                CategorySpec::new("A03", "Supply Chain", "tables/table-3c-a03-software-supply-chain.json"),
                CategorySpec::new("A04", "Cryptographic Failures", "tables/table-3d-a04-cryptographic-failures.json"),
                CategorySpec::new("A05", "Injection", "tables/table-3e-a05-injection.json"),
                CategorySpec::new("A06", "Insecure Design", "tables/table-3f-a06-insecure-design.json"),
                CategorySpec::new("A07", "Authentication Failures", "tables/table-3g-a07-authentication-failures.json"),
                CategorySpec::new("A08", "Data Integrity Failures", "tables/table-3h-a08-data-integrity-failures.json"),
                CategorySpec::new("A09", "Logging Failures", "tables/table-3i-a09-security-logging-failures.json"),
                CategorySpec::new("A10", "Exceptional Conditions", "tables/table-3j-a10-exceptional-conditions.json"),
            ],
            colors: CoverageColors::default(),
        }
    }
}

/// One weakness entry (one grid cell)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CweEntry {
    /// Short label shown in the cell (`1275` for `CWE-1275: ...`)
    pub number: String,
    /// Full first-column text
    pub full_text: String,
    /// Coverage cell as written
    pub coverage: String,
    pub comments: String,
}

impl CweEntry {
    pub fn from_row(row: &[String]) -> Self {
        let cell = |i: usize| row.get(i).cloned().unwrap_or_default();
        let full_text = cell(0);
        Self {
            number: cwe_number(&full_text).to_string(),
            full_text,
            coverage: cell(1),
            comments: cell(2),
        }
    }

    pub fn status(&self) -> Coverage {
        Coverage::from_status(&self.coverage)
    }
}

/// Loaded category; `entries` is empty when its table file could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryData {
    pub id: String,
    pub title: String,
    pub entries: Vec<CweEntry>,
}

fn cwe_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"CWE-(\d+)").expect("valid CWE regex"))
}

/// `CWE-<n>` number in `text`, or the whole text when there is none
pub fn cwe_number(text: &str) -> &str {
    cwe_pattern()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text)
}

/// Loads every configured category, each independently
pub struct HeatmapLoader<'a> {
    source: &'a dyn ContentSource,
    config: &'a HeatmapConfig,
}

impl<'a> HeatmapLoader<'a> {
    pub fn new(source: &'a dyn ContentSource, config: &'a HeatmapConfig) -> Self {
        Self { source, config }
    }

    /// Categories in configured order. A category whose file fails to load keeps
    /// its id and title with no entries.
    pub fn load(&self) -> Vec<CategoryData> {
        self.config
            .categories
            .par_iter()
            .map(|spec| self.load_category(spec))
            .collect()
    }

    fn load_category(&self, spec: &CategorySpec) -> CategoryData {
        let entries = match fetch_json::<TableBlock>(self.source, &spec.table_file) {
            Ok(table) => table.rows.iter().map(|row| CweEntry::from_row(row)).collect(),
            Err(e) => {
                log::warn!(
                    "Heatmap category {} unavailable ({}): {}",
                    spec.id,
                    self.source.describe(&spec.table_file),
                    e
                );
                Vec::new()
            }
        };
        CategoryData {
            id: spec.id.clone(),
            title: spec.title.clone(),
            entries,
        }
    }
}

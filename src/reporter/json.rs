//! JSON reporter for machine-readable check output

use crate::check::{CheckReport, Severity};
use serde::Serialize;

/// Reporter for JSON output
pub struct JsonReporter {
    /// Whether to pretty-print JSON
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Enable pretty-printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Report diagnostics with a summary
    pub fn report(&self, report: &CheckReport) -> String {
        let output = JsonOutput {
            report,
            summary: JsonSummary {
                errors: report.count(Severity::Error),
                warnings: report.count(Severity::Warning),
                infos: report.count(Severity::Info),
            },
        };

        if self.pretty {
            serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
        } else {
            serde_json::to_string(&output).unwrap_or_else(|_| "{}".to_string())
        }
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput<'a> {
    #[serde(flatten)]
    report: &'a CheckReport,
    summary: JsonSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary {
    errors: usize,
    warnings: usize,
    infos: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{CheckKind, Diagnostic};

    fn make_report() -> CheckReport {
        CheckReport {
            content: "content.json".to_string(),
            diagnostics: vec![
                Diagnostic {
                    kind: CheckKind::RowArity,
                    severity: Severity::Error,
                    location: "section 3 > table \"Results\"".to_string(),
                    message: "Row 2 has 1 cells, expected 3".to_string(),
                },
                Diagnostic {
                    kind: CheckKind::AmbiguousListItem,
                    severity: Severity::Info,
                    location: "section 1 > list item 2".to_string(),
                    message: "Item has a colon".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_json_has_expected_keys() {
        let json = JsonReporter::new().report(&make_report());
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["content"], "content.json");
        let diagnostics = parsed["diagnostics"].as_array().unwrap();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0]["kind"], "row-arity");
        assert_eq!(diagnostics[0]["severity"], "error");
        assert_eq!(parsed["summary"]["errors"], 1);
        assert_eq!(parsed["summary"]["warnings"], 0);
        assert_eq!(parsed["summary"]["infos"], 1);
    }

    #[test]
    fn test_json_pretty_output() {
        let json = JsonReporter::new().pretty().report(&make_report());
        assert!(json.contains('\n'), "pretty JSON should have newlines");
        assert!(json.contains("  "), "pretty JSON should have indentation");
    }

    #[test]
    fn test_json_empty_report() {
        let json = JsonReporter::new().report(&CheckReport::default());
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["diagnostics"].as_array().unwrap().is_empty());
    }
}

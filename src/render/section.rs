//! Section and subsection composition
//!
//! Block order inside a section is fixed: paragraphs, lists, subsections,
//! chart, heatmap, tables, trailing paragraphs, then the reference list.
//! Subsections put their tables before the chart and heatmap.

use super::chart::render_chart;
use super::citations::CitationIndex;
use super::escape::escape;
use super::heatmap::render_heatmap;
use super::list::render_list;
use super::reference::render_reference_list;
use super::table::render_table;
use super::{error_fragment, ElementIds, Fragment};
use crate::document::{
    Block, ChartDescriptor, HeatmapDescriptor, Ident, Reference, Section, SectionBody,
    Subsection, TableBlock, TableSource,
};
use crate::source::{fetch_json, ContentSource};
use std::path::Path;

/// Renders sections against one document's references and content source
pub struct SectionComposer<'a> {
    source: &'a dyn ContentSource,
    citations: &'a CitationIndex,
    references: &'a [Block<Reference>],
    wide_sections: &'a [Ident],
}

impl<'a> SectionComposer<'a> {
    pub fn new(
        source: &'a dyn ContentSource,
        citations: &'a CitationIndex,
        references: &'a [Block<Reference>],
    ) -> Self {
        Self {
            source,
            citations,
            references,
            wide_sections: &[],
        }
    }

    /// Section numbers that always get the wide layout
    pub fn wide_sections(mut self, numbers: &'a [Ident]) -> Self {
        self.wide_sections = numbers;
        self
    }

    /// Whether the section uses the full-width layout
    pub fn is_wide(&self, section: &Section) -> bool {
        section.wide
            || self.wide_sections.contains(&section.number)
            || section.body.has_wide_blocks()
            || section.subsections.iter().any(|s| s.body.has_wide_blocks())
    }

    /// Render one section. `position` scopes the element ids of its charts and
    /// heatmaps so sections can render concurrently.
    pub fn render_section(&self, section: &Section, position: usize) -> Fragment {
        let mut ids = ElementIds::new(position.to_string());

        let mut class = String::from(if self.is_wide(section) {
            "section section-with-table"
        } else {
            "section"
        });
        if section.references {
            class.push_str(" section-references");
        }

        let number = escape(section.number.as_str());
        let mut out = Fragment::new(format!(
            "<section class=\"{class}\" id=\"section-{number}\"><h2>{number}. {}</h2>",
            escape(&section.title)
        ));

        let body = &section.body;
        out.push_str(&self.paragraphs(&body.paragraphs));
        out.push_str(&self.lists(body));
        for subsection in &section.subsections {
            out.append(self.render_subsection(subsection, &mut ids));
        }
        out.append(self.chart(body.chart.as_ref(), &mut ids));
        out.append(self.heatmap(body.heatmap.as_ref(), &mut ids));
        out.push_str(&self.tables(body));
        out.push_str(&self.paragraphs(&body.paragraphs_after));
        if section.references {
            out.push_str(&render_reference_list(self.references));
        }
        out.push_str("</section>");
        out
    }

    pub fn render_subsection(&self, subsection: &Subsection, ids: &mut ElementIds) -> Fragment {
        let mut out = Fragment::new(format!(
            "<h3>{} {}</h3>",
            escape(subsection.number.as_str()),
            escape(&subsection.title)
        ));
        let body = &subsection.body;
        out.push_str(&self.paragraphs(&body.paragraphs));
        out.push_str(&self.lists(body));
        out.push_str(&self.tables(body));
        out.append(self.chart(body.chart.as_ref(), ids));
        out.append(self.heatmap(body.heatmap.as_ref(), ids));
        out.push_str(&self.paragraphs(&body.paragraphs_after));
        out
    }

    fn paragraphs(&self, paragraphs: &[String]) -> String {
        paragraphs
            .iter()
            .map(|p| format!("<p>{}</p>", self.citations.resolve(&escape(p))))
            .collect()
    }

    fn lists(&self, body: &SectionBody) -> String {
        body.lists
            .iter()
            .map(|list| match list {
                Ok(list) => render_list(list, self.citations),
                Err(e) => block_error(e),
            })
            .collect()
    }

    fn tables(&self, body: &SectionBody) -> String {
        body.tables
            .iter()
            .map(|table| match table {
                Ok(TableSource::Inline(table)) => render_table(table, self.citations),
                Ok(TableSource::File(path)) => self.table_file(path),
                Err(e) => block_error(e),
            })
            .collect()
    }

    fn table_file(&self, path: &Path) -> String {
        match fetch_json::<TableBlock>(self.source, path) {
            Ok(table) => render_table(&table, self.citations),
            Err(e) => {
                log::warn!("Error loading table from {}: {}", self.source.describe(path), e);
                error_fragment(&format!("Error loading table from {}", path.display()))
            }
        }
    }

    fn chart(&self, chart: Option<&Block<ChartDescriptor>>, ids: &mut ElementIds) -> Fragment {
        match chart {
            None => Fragment::default(),
            Some(Ok(chart)) => render_chart(chart, &ids.next("chart")),
            Some(Err(e)) => Fragment::new(block_error(e)),
        }
    }

    fn heatmap(
        &self,
        heatmap: Option<&Block<HeatmapDescriptor>>,
        ids: &mut ElementIds,
    ) -> Fragment {
        match heatmap {
            None => Fragment::default(),
            Some(Ok(heatmap)) => render_heatmap(heatmap, &ids.next("heatmap")),
            Some(Err(e)) => Fragment::new(block_error(e)),
        }
    }
}

fn block_error(error: &crate::error::ReportError) -> String {
    log::warn!("{}", error);
    error_fragment(&error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ReportDocument;
    use crate::render::Mount;
    use crate::source::FsSource;
    use std::fs;
    use tempfile::TempDir;

    fn compose(json: &str, dir: &Path, wide: &[Ident]) -> Vec<Fragment> {
        let doc = ReportDocument::from_json_str(json).unwrap();
        let source = FsSource::new(dir);
        let citations = CitationIndex::for_document(&doc.references);
        let composer =
            SectionComposer::new(&source, &citations, &doc.references).wide_sections(wide);
        doc.sections
            .iter()
            .enumerate()
            .map(|(i, s)| composer.render_section(s, i + 1))
            .collect()
    }

    fn position(html: &str, needle: &str) -> usize {
        html.find(needle)
            .unwrap_or_else(|| panic!("missing {needle} in {html}"))
    }

    #[test]
    fn test_section_block_order() {
        let dir = TempDir::new().unwrap();
        let html = &compose(
            r#"{"sections": [{
                "number": 2, "title": "Order",
                "paragraphsAfter": ["after"],
                "table": {"caption": "T", "headers": ["a"], "rows": [["1"]]},
                "heatmap": true,
                "chart": {"type": "bar"},
                "subsections": [{"number": "2.1", "title": "Sub", "paragraphs": ["sub text"]}],
                "lists": [{"type": "ul", "items": ["item"]}],
                "paragraphs": ["first"]
            }]}"#,
            dir.path(),
            &[],
        )[0]
            .html;

        let order = [
            "<p>first</p>",
            "<ul>",
            "<h3>2.1 Sub</h3>",
            "<canvas",
            "heatmap-container",
            "<table",
            "<p>after</p>",
        ];
        let positions: Vec<usize> = order.iter().map(|n| position(html, n)).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
        assert!(html.starts_with(
            "<section class=\"section section-with-table\" id=\"section-2\"><h2>2. Order</h2>"
        ));
        assert!(html.ends_with("</section>"));
    }

    #[test]
    fn test_subsection_puts_tables_before_chart() {
        let dir = TempDir::new().unwrap();
        let html = &compose(
            r#"{"sections": [{"number": 1, "title": "S", "subsections": [{
                "number": "1.1", "title": "Sub",
                "chart": {"type": "line"},
                "table": {"caption": "T", "headers": ["a"], "rows": [["1"]]}
            }]}]}"#,
            dir.path(),
            &[],
        )[0]
            .html;
        assert!(position(html, "<table") < position(html, "<canvas"));
        assert!(html.contains("class=\"section section-with-table\""));
    }

    #[test]
    fn test_failed_table_file_is_contained() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("tables")).unwrap();
        fs::write(
            dir.path().join("tables/ok.json"),
            r#"{"caption": "Loaded", "headers": ["a"], "rows": [["1"]]}"#,
        )
        .unwrap();
        let html = &compose(
            r#"{"sections": [{"number": 3, "title": "Files",
                "tableFiles": ["tables/missing.json", "tables/ok.json"]}]}"#,
            dir.path(),
            &[],
        )[0]
            .html;
        assert!(html.contains(
            "<p class=\"render-error\" style=\"color: red;\">Error loading table from tables/missing.json</p>"
        ));
        assert!(html.contains("<caption>Loaded</caption>"));
    }

    #[test]
    fn test_wide_layout_sources() {
        let dir = TempDir::new().unwrap();
        let json = r#"{"sections": [
            {"number": 5, "title": "Plain"},
            {"number": 6, "title": "Listed"},
            {"number": 7, "title": "Flagged", "wide": true},
            {"number": 8, "title": "Refs", "references": true}
        ], "references": ["One"]}"#;
        let fragments = compose(json, dir.path(), &[Ident::from(6)]);
        assert!(fragments[0].html.starts_with("<section class=\"section\" "));
        assert!(fragments[1].html.starts_with("<section class=\"section section-with-table\""));
        assert!(fragments[2].html.starts_with("<section class=\"section section-with-table\""));
        assert!(fragments[3]
            .html
            .starts_with("<section class=\"section section-references\""));
        assert!(fragments[3].html.contains("<p id=\"ref-1\">One</p>"));
    }

    #[test]
    fn test_mount_ids_are_scoped_by_position() {
        let dir = TempDir::new().unwrap();
        let fragments = compose(
            r#"{"sections": [
                {"number": 1, "title": "A", "chart": {"type": "line"}},
                {"number": 2, "title": "B", "chart": {"type": "line"}, "heatmap": true}
            ]}"#,
            dir.path(),
            &[],
        );
        assert_eq!(fragments[0].mounts[0].id(), "chart-1-1");
        assert_eq!(fragments[1].mounts[0].id(), "chart-2-1");
        assert!(matches!(&fragments[1].mounts[1], Mount::Heatmap { id } if id == "heatmap-2-2"));
    }

    #[test]
    fn test_invalid_block_renders_inline_error() {
        let dir = TempDir::new().unwrap();
        let html = &compose(
            r#"{"sections": [{"number": 1, "title": "A", "paragraphs": ["kept"],
                "chart": "nope", "lists": [{"type": "ol"}]}]}"#,
            dir.path(),
            &[],
        )[0]
            .html;
        assert!(html.contains("<p>kept</p>"));
        assert_eq!(html.matches("class=\"render-error\"").count(), 2);
    }

    #[test]
    fn test_paragraph_citations_resolve() {
        let dir = TempDir::new().unwrap();
        let html = &compose(
            r#"{"sections": [{"number": 1, "title": "A", "paragraphs": ["See <this> [1]"]}],
                "references": [{"id": 1, "title": "Ref"}]}"#,
            dir.path(),
            &[],
        )[0]
            .html;
        assert!(html.contains("See &lt;this&gt; <sup class=\"citation\">"));
        assert!(html.contains("href=\"#ref-1\""));
    }
}

//! Report assembly: header, abstract, sections, mount step and footer

use super::citations::CitationIndex;
use super::escape::escape;
use super::heatmap::{mount_heatmap, render_grid};
use super::page::{render_page, DEFAULT_CHART_JS_URL};
use super::section::SectionComposer;
use super::{Fragment, Mount};
use crate::document::{Ident, ReportDocument};
use crate::error::ReportError;
use crate::heatmap::{HeatmapConfig, HeatmapLoader};
use crate::source::ContentSource;
use rayon::prelude::*;
use serde_json::Value;
use std::path::Path;

/// Rendering options
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Section numbers forced to the wide layout
    pub wide_sections: Vec<Ident>,
    pub heatmap: HeatmapConfig,
    /// Render sections on the rayon pool
    pub parallel: bool,
    pub chart_js_url: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            wide_sections: vec![Ident::from(6)],
            heatmap: HeatmapConfig::default(),
            parallel: true,
            chart_js_url: DEFAULT_CHART_JS_URL.to_string(),
        }
    }
}

impl RenderOptions {
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn with_wide_sections(mut self, numbers: Vec<Ident>) -> Self {
        self.wide_sections = numbers;
        self
    }

    pub fn with_heatmap(mut self, heatmap: HeatmapConfig) -> Self {
        self.heatmap = heatmap;
        self
    }
}

/// A chart waiting for the page runtime
#[derive(Debug, Clone, PartialEq)]
pub struct ChartMount {
    pub id: String,
    pub config: Value,
}

/// Output of one render
#[derive(Debug)]
pub struct RenderedReport {
    pub title: String,
    /// Inner HTML of the report container
    pub content: String,
    pub charts: Vec<ChartMount>,
    /// Set when the document could not be loaded; `content` is then the error message
    pub error: Option<ReportError>,
}

impl RenderedReport {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Full standalone HTML page
    pub fn to_page(&self, chart_js_url: &str) -> String {
        render_page(self, chart_js_url)
    }
}

pub struct ReportRenderer {
    options: RenderOptions,
}

impl ReportRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Load `path` from `source` and render it. A load failure replaces the
    /// whole report with one error message.
    pub fn render_from(&self, source: &dyn ContentSource, path: &Path) -> RenderedReport {
        match ReportDocument::load(source, path) {
            Ok(doc) => self.render_document(&doc, source),
            Err(e) => {
                log::error!("Error loading report content: {}", e);
                RenderedReport {
                    title: String::new(),
                    content: load_error_message(path),
                    charts: Vec::new(),
                    error: Some(e),
                }
            }
        }
    }

    pub fn render_document(&self, doc: &ReportDocument, source: &dyn ContentSource) -> RenderedReport {
        let citations = CitationIndex::for_document(&doc.references);
        let composer = SectionComposer::new(source, &citations, &doc.references)
            .wide_sections(&self.options.wide_sections);

        let fragments: Vec<Fragment> = if self.options.parallel {
            doc.sections
                .par_iter()
                .enumerate()
                .map(|(i, section)| composer.render_section(section, i + 1))
                .collect()
        } else {
            doc.sections
                .iter()
                .enumerate()
                .map(|(i, section)| composer.render_section(section, i + 1))
                .collect()
        };

        let mut sections = Fragment::default();
        for fragment in fragments {
            sections.append(fragment);
        }

        let metadata = &doc.metadata;
        let mut content = String::with_capacity(sections.html.len() + 2048);
        content.push_str("<header class=\"paper-header\">");
        content.push_str(&format!(
            "<h1 class=\"paper-title\">{}</h1>",
            escape(&metadata.title)
        ));
        content.push_str(&format!(
            "<div class=\"author-block\"><div class=\"author\">{}</div><div class=\"affiliation\">{}</div></div>",
            escape(&metadata.author),
            escape(&metadata.affiliation)
        ));
        content.push_str(&format!("<div class=\"date\">{}</div>", escape(&metadata.date)));
        if let Some(region) = metadata.region.as_deref().filter(|r| !r.is_empty()) {
            content.push_str(&format!("<div class=\"region\">{}</div>", escape(region)));
        }
        content.push_str("</header>");
        content.push_str(&format!(
            "<section class=\"abstract\"><h2>Abstract</h2><p>{}</p></section>",
            citations.resolve(&escape(&doc.abstract_text))
        ));
        content.push_str("<div class=\"paper-content\">");
        content.push_str(&sections.html);
        content.push_str("</div>");
        content.push_str(&format!(
            "<footer class=\"paper-footer\"><p><em>Review completed: {} | Status: {}</em></p></footer>",
            escape(&metadata.date),
            escape(&metadata.status)
        ));

        let charts = self.mount(&mut content, sections.mounts, source);

        RenderedReport {
            title: metadata.title.clone(),
            content,
            charts,
            error: None,
        }
    }

    /// Fill heatmap placeholders in place and hand chart mounts back for the page runtime
    fn mount(&self, content: &mut String, mounts: Vec<Mount>, source: &dyn ContentSource) -> Vec<ChartMount> {
        let mut charts = Vec::new();
        let mut grid: Option<String> = None;

        for mount in mounts {
            match mount {
                Mount::Chart { id, config } => charts.push(ChartMount { id, config }),
                Mount::Heatmap { id } => {
                    let grid = grid.get_or_insert_with(|| {
                        let data = HeatmapLoader::new(source, &self.options.heatmap).load();
                        render_grid(&data, &self.options.heatmap.colors)
                    });
                    mount_heatmap(content, &id, grid);
                }
            }
        }
        log::debug!("Mounted report with {} chart(s)", charts.len());
        charts
    }
}

/// Message shown in place of the report when the content document cannot be loaded
pub fn load_error_message(path: &Path) -> String {
    format!(
        "<p class=\"render-error\" style=\"color: red; padding: 20px;\">Error loading report content. Please ensure {} exists.</p>",
        escape(&path.display().to_string())
    )
}

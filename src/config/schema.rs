//! Config schema and deserialization

use crate::document::{Ident, DEFAULT_CONTENT_FILE};
use crate::export::DEFAULT_PDF_FILE;
use crate::heatmap::{CategorySpec, CoverageColors, HeatmapConfig};
use crate::render::page::DEFAULT_CHART_JS_URL;
use crate::render::RenderOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_FILE: &str = "report.html";

/// Page layout settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Section numbers that always use the wide layout. Default: `[6]`
    #[serde(default)]
    pub wide_sections: Option<Vec<Ident>>,
}

/// Heatmap settings; unset fields fall back to the built-in categories and colours
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapSettings {
    #[serde(default)]
    pub categories: Option<Vec<CategorySpec>>,
    #[serde(default)]
    pub colors: Option<CoverageColors>,
}

/// Root config structure for .dossierrc.json
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Extend another config file (path relative to this config)
    #[serde(default)]
    pub extends: Option<String>,

    /// Content document. Default: content.json
    #[serde(default)]
    pub content: Option<PathBuf>,

    /// Rendered HTML page. Default: report.html
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Exported PDF
    #[serde(default)]
    pub pdf_output: Option<PathBuf>,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub heatmap: HeatmapSettings,

    /// Chart.js script included when the report has charts
    #[serde(default)]
    pub chart_js_url: Option<String>,

    /// Headless browser used for PDF capture (path or name on PATH)
    #[serde(default)]
    pub browser: Option<PathBuf>,
}

impl Config {
    /// Merge CLI overrides into config. CLI values take precedence.
    pub fn merge_with_cli(
        mut self,
        cli_content: Option<&Path>,
        cli_output: Option<&Path>,
        cli_browser: Option<&Path>,
    ) -> Self {
        if let Some(content) = cli_content {
            self.content = Some(content.to_path_buf());
        }
        if let Some(output) = cli_output {
            self.output = Some(output.to_path_buf());
        }
        if let Some(browser) = cli_browser {
            self.browser = Some(browser.to_path_buf());
        }
        self
    }

    /// Merge another config into this one (for extends)
    pub fn merge_from(&mut self, base: Config) {
        // Base values are overridden by this config's values
        if self.extends.is_none() {
            self.extends = base.extends;
        }
        if self.content.is_none() {
            self.content = base.content;
        }
        if self.output.is_none() {
            self.output = base.output;
        }
        if self.pdf_output.is_none() {
            self.pdf_output = base.pdf_output;
        }
        if self.layout.wide_sections.is_none() {
            self.layout.wide_sections = base.layout.wide_sections;
        }
        if self.heatmap.categories.is_none() {
            self.heatmap.categories = base.heatmap.categories;
        }
        if self.heatmap.colors.is_none() {
            self.heatmap.colors = base.heatmap.colors;
        }
        if self.chart_js_url.is_none() {
            self.chart_js_url = base.chart_js_url;
        }
        if self.browser.is_none() {
            self.browser = base.browser;
        }
    }

    pub fn content_path(&self) -> PathBuf {
        self.content
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTENT_FILE))
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE))
    }

    pub fn pdf_output_path(&self) -> PathBuf {
        self.pdf_output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PDF_FILE))
    }

    pub fn chart_js_url(&self) -> &str {
        self.chart_js_url.as_deref().unwrap_or(DEFAULT_CHART_JS_URL)
    }

    pub fn heatmap_config(&self) -> HeatmapConfig {
        let defaults = HeatmapConfig::default();
        HeatmapConfig {
            categories: self
                .heatmap
                .categories
                .clone()
                .unwrap_or(defaults.categories),
            colors: self.heatmap.colors.clone().unwrap_or(defaults.colors),
        }
    }

    /// Render options implied by this config
    pub fn render_options(&self) -> RenderOptions {
        let mut options = RenderOptions::default().with_heatmap(self.heatmap_config());
        if let Some(wide) = &self.layout.wide_sections {
            options = options.with_wide_sections(wide.clone());
        }
        options.chart_js_url = self.chart_js_url().to_string();
        options
    }
}

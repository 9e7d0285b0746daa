//! Dossier: static renderer for security-testing reports
//!
//! Loads a JSON content document (metadata, sections, tables, references,
//! charts, coverage heatmaps) and renders it to a self-contained HTML page,
//! with an optional paginated A4 PDF export of the rendered page.
//!
//! ```no_run
//! use dossier::render::{RenderOptions, ReportRenderer};
//! use dossier::source::FsSource;
//! use std::path::Path;
//!
//! let source = FsSource::new("docs");
//! let report = ReportRenderer::new(RenderOptions::default())
//!     .render_from(&source, Path::new("content.json"));
//! let page = report.to_page(&RenderOptions::default().chart_js_url);
//! std::fs::write("docs/report.html", page).unwrap();
//! ```

pub mod check;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod heatmap;
pub mod logging;
pub mod render;
pub mod reporter;
pub mod source;
pub mod watcher;

pub use document::ReportDocument;
pub use error::{ReportError, Result};
pub use render::{RenderOptions, RenderedReport, ReportRenderer};

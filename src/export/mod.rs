//! PDF export of a rendered report page
//!
//! The page is captured as one tall raster (headless Chromium, or an image the
//! caller already has), scaled to the printable width of the page policy and
//! sliced into pages. Preconditions that fail (no report container in the page,
//! no browser) abort the export without touching the output path.

pub mod capture;
pub mod pagination;
pub mod pdf;

pub use pagination::{paginate, PagePolicy, Segment};

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_PDF_FILE: &str = "Security-Testing-Report.pdf";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF assembly failed: {0}")]
    Pdf(String),

    #[error("Capture is empty; nothing to paginate")]
    EmptyCapture,
}

/// Why an export did not start
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// The page has no `report-content` element
    MissingContainer,
    /// No Chromium-family browser could be found
    NoBrowser,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::MissingContainer => f.write_str("Report content element not found"),
            AbortReason::NoBrowser => f.write_str(
                "No headless browser found in PATH (chromium or google-chrome); \
                 install one, set \"browser\" in the config, or pass --image",
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { path: PathBuf, pages: usize },
    Aborted(AbortReason),
}

pub struct PdfExporter {
    policy: PagePolicy,
    browser: Option<PathBuf>,
    title: String,
}

impl PdfExporter {
    pub fn new() -> Self {
        Self {
            policy: PagePolicy::A4,
            browser: None,
            title: "Report".to_string(),
        }
    }

    /// Browser to capture with, as a path or a name on `PATH`
    pub fn browser(mut self, browser: impl Into<PathBuf>) -> Self {
        self.browser = Some(browser.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn policy(&self) -> &PagePolicy {
        &self.policy
    }

    /// Capture the rendered page `html` and write it to `output`
    pub fn export_page(&self, html: &str, output: &Path) -> Result<ExportOutcome, ExportError> {
        let Some(prepared) = capture::prepare_for_export(html) else {
            return Ok(self.abort(AbortReason::MissingContainer));
        };
        let Some(browser) = capture::resolve_browser(self.browser.as_deref()) else {
            return Ok(self.abort(AbortReason::NoBrowser));
        };
        let image = capture::capture(&browser, &prepared, &self.policy)?;
        self.write(&image, output)
    }

    /// Paginate an existing capture of the page
    pub fn export_image(&self, image_path: &Path, output: &Path) -> Result<ExportOutcome, ExportError> {
        let image = image::open(image_path)?;
        self.write(&capture::trim_trailing_background(image), output)
    }

    fn write(&self, image: &image::DynamicImage, output: &Path) -> Result<ExportOutcome, ExportError> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ExportError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let pages = pdf::assemble(image, &self.policy, &self.title, output)?;
        Ok(ExportOutcome::Written {
            path: output.to_path_buf(),
            pages,
        })
    }

    fn abort(&self, reason: AbortReason) -> ExportOutcome {
        log::error!("PDF export aborted: {}", reason);
        ExportOutcome::Aborted(reason)
    }
}

impl Default for PdfExporter {
    fn default() -> Self {
        Self::new()
    }
}

//! Raster capture of the rendered page with a headless Chromium

use super::pagination::PagePolicy;
use super::ExportError;
use crate::render::page::REPORT_CONTAINER_ID;
use image::{DynamicImage, GenericImageView};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::OnceLock;

const BROWSER_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
    "msedge",
    "microsoft-edge",
];

/// Path characters escaped in a `file://` URL
const FILE_URL: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const EXPORT_CSS: &str = "<style>body.exporting { background: #ffffff; } \
    body.exporting .report-content { margin-top: 0; margin-bottom: 0; }</style>";

/// Whether `html` contains the report container the exporter captures
pub fn has_report_container(html: &str) -> bool {
    html.contains(&format!("id=\"{REPORT_CONTAINER_ID}\""))
}

/// Copy of `html` with export styling applied, or `None` when there is no
/// report container to capture
pub fn prepare_for_export(html: &str) -> Option<String> {
    if !has_report_container(html) {
        return None;
    }
    let mut out = html.replacen("<body>", "<body class=\"exporting\">", 1);
    if let Some(at) = out.find("</head>") {
        out.insert_str(at, EXPORT_CSS);
    }
    Some(out)
}

/// Find a Chromium-family browser: `configured` if given (a path or a name on
/// `PATH`), otherwise the first known browser on `PATH`
pub fn resolve_browser(configured: Option<&Path>) -> Option<PathBuf> {
    match configured {
        Some(path) if path.components().count() > 1 => {
            is_executable(path).then(|| path.to_path_buf())
        }
        Some(name) => name.to_str().and_then(|n| resolve_executable(&[n])),
        None => resolve_executable(BROWSER_CANDIDATES),
    }
}

fn resolve_executable(candidates: &[&str]) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var).find_map(|dir| {
        candidates
            .iter()
            .map(|candidate| dir.join(candidate))
            .find(|full| is_executable(full))
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    match fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn file_url(path: &Path) -> Result<String, ExportError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map_err(|source| ExportError::Io {
                path: PathBuf::from("."),
                source,
            })?
            .join(path)
    };
    let mut value = absolute.to_string_lossy().replace('\\', "/");
    if !value.starts_with('/') {
        value.insert(0, '/');
    }
    Ok(format!("file://{}", utf8_percent_encode(&value, FILE_URL)))
}

/// Records the laid-out page height on `<html data-export-height>` once the page has loaded
const HEIGHT_SCRIPT: &str = "<script>window.addEventListener('load', function () {\
    var c = document.getElementById('report-content');\
    var bottom = c ? Math.ceil(c.getBoundingClientRect().bottom + window.scrollY) : 0;\
    var h = Math.max(document.documentElement.scrollHeight, document.body.scrollHeight, bottom);\
    document.documentElement.setAttribute('data-export-height', String(h));\
});</script>";

/// Background rows added below the measured height so the bottom edge is known to be empty
const MEASURE_PADDING: u32 = 64;

/// Viewport height used while measuring, CSS pixels
const MEASURE_VIEWPORT: u32 = 1000;

fn height_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"data-export-height="(\d+)""#).expect("valid height regex"))
}

/// Copy of `html` that reports its own height in the dumped DOM
pub fn with_height_script(html: &str) -> String {
    match html.rfind("</body>") {
        Some(at) => {
            let mut out = html.to_string();
            out.insert_str(at, HEIGHT_SCRIPT);
            out
        }
        None => format!("{html}{HEIGHT_SCRIPT}"),
    }
}

/// Height written by the height script, from a dumped DOM
pub fn parse_measured_height(dom: &str) -> Option<u32> {
    height_pattern()
        .captures(dom)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Viewport height for a page measured at `measured` CSS pixels. Pages taller
/// than the policy allows are refused rather than cut off.
pub fn viewport_height(measured: u32, policy: &PagePolicy) -> Result<u32, ExportError> {
    let height = measured.saturating_add(MEASURE_PADDING);
    if height > policy.capture_max_height {
        return Err(ExportError::Capture(format!(
            "report is {} px tall; the capture limit is {} px",
            measured, policy.capture_max_height
        )));
    }
    Ok(height)
}

fn browser_command(browser: &Path, policy: &PagePolicy, height: u32) -> Command {
    let mut cmd = Command::new(browser);
    cmd.arg("--headless")
        .arg("--disable-gpu")
        .arg("--hide-scrollbars")
        .arg("--allow-file-access-from-files")
        .arg("--virtual-time-budget=5000")
        .arg(format!("--force-device-scale-factor={}", policy.scale))
        .arg(format!("--window-size={},{}", policy.capture_width, height));
    cmd
}

fn run(browser: &Path, mut cmd: Command) -> Result<Output, ExportError> {
    let output = cmd.output().map_err(|e| {
        ExportError::Capture(format!("failed to run {}: {}", browser.display(), e))
    })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExportError::Capture(format!(
            "{} exited with {}: {}",
            browser.display(),
            output.status,
            stderr.trim()
        )));
    }
    Ok(output)
}

fn write_file(path: &Path, contents: &str) -> Result<(), ExportError> {
    fs::write(path, contents).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Lay the page out once and read back its full height
fn measure(browser: &Path, workdir: &Path, html: &str, policy: &PagePolicy) -> Result<u32, ExportError> {
    let page = workdir.join("measure.html");
    write_file(&page, &with_height_script(html))?;

    let mut cmd = browser_command(browser, policy, MEASURE_VIEWPORT);
    cmd.arg("--dump-dom").arg(file_url(&page)?);
    let output = run(browser, cmd)?;

    parse_measured_height(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
        ExportError::Capture(format!(
            "{} did not report the page height",
            browser.display()
        ))
    })
}

/// Screenshot `html` (already prepared for export) with `browser`, sizing the
/// viewport to the full height of the page
pub fn capture(browser: &Path, html: &str, policy: &PagePolicy) -> Result<DynamicImage, ExportError> {
    let workdir = tempfile::Builder::new()
        .prefix("dossier-capture")
        .tempdir()
        .map_err(|source| ExportError::Io {
            path: env::temp_dir(),
            source,
        })?;

    let measured = measure(browser, workdir.path(), html, policy)?;
    let height = viewport_height(measured, policy)?;
    log::debug!(
        "Capturing {}x{} px with {}",
        policy.capture_width,
        height,
        browser.display()
    );

    let page = workdir.path().join("report.html");
    let shot = workdir.path().join("report.png");
    write_file(&page, html)?;

    let mut cmd = browser_command(browser, policy, height);
    cmd.arg(format!("--screenshot={}", shot.display()))
        .arg(file_url(&page)?);
    run(browser, cmd)?;
    if !shot.exists() {
        return Err(ExportError::Capture(format!(
            "{} wrote no screenshot",
            browser.display()
        )));
    }

    require_trailing_background(image::open(&shot)?)
}

/// Trim the empty rows below the page. A capture whose content reaches the
/// bottom edge was cut off by the viewport and is refused.
pub fn require_trailing_background(image: DynamicImage) -> Result<DynamicImage, ExportError> {
    let height = image.height();
    let trimmed = trim_trailing_background(image);
    if trimmed.height() == height {
        return Err(ExportError::Capture(
            "page content reaches the bottom of the capture; the report would be cut off"
                .to_string(),
        ));
    }
    Ok(trimmed)
}

/// Drop uniform rows at the bottom of a capture (the unused part of the viewport)
pub fn trim_trailing_background(image: DynamicImage) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image;
    }
    let background = image.get_pixel(0, height - 1);
    let mut last = height;
    while last > 1 {
        let row = last - 1;
        if (0..width).any(|x| image.get_pixel(x, row) != background) {
            break;
        }
        last -= 1;
    }
    if last == height {
        image
    } else {
        image.crop_imm(0, 0, width, last)
    }
}

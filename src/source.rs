//! Content sources: where the report document and its table files come from

use crate::error::{ReportError, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Something that can hand back the bytes stored at a relative content path.
///
/// Paths are the ones written in the content document (`tables/x.json`), resolved
/// by the source against its own root.
pub trait ContentSource: Send + Sync {
    /// Read the text stored at `path`
    fn fetch(&self, path: &Path) -> Result<String>;

    /// Human-readable location of `path`, used in error messages
    fn describe(&self, path: &Path) -> String {
        path.display().to_string()
    }
}

/// Decode JSON fetched through a trait object
pub fn fetch_json<T: DeserializeOwned>(source: &dyn ContentSource, path: &Path) -> Result<T> {
    let text = source.fetch(path)?;
    serde_json::from_str(&text).map_err(|source| ReportError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads content from the local filesystem, relative to a root directory
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Source rooted at the directory containing `content_file`
    pub fn for_content_file(content_file: &Path) -> Self {
        let root = content_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl ContentSource for FsSource {
    fn fetch(&self, path: &Path) -> Result<String> {
        let full = self.resolve(path);
        fs::read_to_string(&full).map_err(|e| ReportError::fetch(path, e))
    }

    fn describe(&self, path: &Path) -> String {
        self.resolve(path).display().to_string()
    }
}

/// Source for a content document location, plus the document's path within it.
///
/// Local files are read relative to their own directory. With the `remote`
/// feature, an `http://` or `https://` location is read relative to its base URL.
pub fn source_for(content: &Path) -> (Box<dyn ContentSource>, PathBuf) {
    let name = content
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| content.to_path_buf());

    #[cfg(feature = "remote")]
    {
        let location = content.to_string_lossy();
        if location.starts_with("http://") || location.starts_with("https://") {
            let base = location
                .rsplit_once('/')
                .map(|(base, _)| base)
                .unwrap_or(location.as_ref());
            return (Box::new(HttpSource::new(base)), name);
        }
    }

    (Box::new(FsSource::for_content_file(content)), name)
}

/// Reads content over HTTP(S), relative to a base URL
#[cfg(feature = "remote")]
pub struct HttpSource {
    base: String,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "remote")]
impl HttpSource {
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        if !base.ends_with('/') {
            base.push('/');
        }
        Self {
            base,
            client: reqwest::blocking::Client::new(),
        }
    }

    fn url_for(&self, path: &Path) -> String {
        let rel = path.to_string_lossy().replace('\\', "/");
        format!("{}{}", self.base, rel.trim_start_matches("./"))
    }
}

#[cfg(feature = "remote")]
impl ContentSource for HttpSource {
    fn fetch(&self, path: &Path) -> Result<String> {
        let url = self.url_for(path);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| ReportError::fetch(path, e))?;
        if !response.status().is_success() {
            return Err(ReportError::fetch(path, response.status()));
        }
        response.text().map_err(|e| ReportError::fetch(path, e))
    }

    fn describe(&self, path: &Path) -> String {
        self.url_for(path)
    }
}

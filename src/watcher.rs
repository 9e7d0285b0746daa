//! File system watcher for watch mode

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;
use walkdir::{DirEntry, WalkDir};

const DEBOUNCE_MS: u64 = 300;

/// Watches the content directory for JSON changes and emits paths on a channel
pub struct ContentWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<notify::Result<notify::Event>>,
}

fn is_relevant(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_))
}

impl ContentWatcher {
    /// Start watching the directory tree that holds `content`
    pub fn watch(content: &Path) -> notify::Result<Self> {
        let (tx, rx) = channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default().with_poll_interval(Duration::from_millis(DEBOUNCE_MS)),
        )?;

        let root = if content.is_dir() {
            content
        } else {
            content
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."))
        };
        watcher.watch(root, RecursiveMode::Recursive)?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
        })
    }

    /// Whether a changed path can affect the rendered report
    pub fn is_content_file(p: &Path) -> bool {
        p.extension().is_some_and(|ext| ext == "json")
    }

    fn paths_from_event(event: &notify::Event) -> Vec<PathBuf> {
        if !is_relevant(&event.kind) {
            return vec![];
        }
        event
            .paths
            .iter()
            .filter(|p| Self::is_content_file(p))
            .cloned()
            .collect()
    }

    /// Wait for the next batch of changes (debounced). Blocks until at least one change, then drains for DEBOUNCE_MS.
    pub fn next_changes(&self) -> Vec<PathBuf> {
        let mut all = HashSet::new();

        match self.receiver.recv_timeout(Duration::from_secs(3600)) {
            Ok(Ok(event)) => all.extend(Self::paths_from_event(&event)),
            Ok(Err(e)) => {
                log::warn!("Watch error: {}", e);
                return vec![];
            }
            Err(_) => return vec![],
        }

        // Debounce: collect further events for a short time
        std::thread::sleep(Duration::from_millis(DEBOUNCE_MS));
        while let Ok(ev) = self.receiver.try_recv() {
            if let Ok(event) = ev {
                all.extend(Self::paths_from_event(&event));
            }
        }

        let mut paths: Vec<PathBuf> = all.into_iter().collect();
        paths.sort();
        paths
    }
}

/// Fingerprint of the JSON inputs under `root`, used to skip renders when
/// nothing actually changed (editors often write the same bytes twice)
#[derive(Debug, Default)]
pub struct InputFingerprint {
    last: Option<String>,
}

impl InputFingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    /// SHA-256 over every JSON file under `root` (path and content, sorted by path)
    pub fn compute(root: &Path) -> String {
        let mut files = collect_json(root);
        files.sort();

        let mut hasher = Sha256::new();
        for file in files {
            if let Ok(bytes) = fs::read(&file) {
                hasher.update(file.to_string_lossy().as_bytes());
                hasher.update([0u8]);
                hasher.update(&bytes);
            }
        }
        hex::encode(hasher.finalize())
    }

    /// Record `hash`; true when it differs from the previous one
    pub fn changed(&mut self, hash: String) -> bool {
        if self.last.as_deref() == Some(hash.as_str()) {
            return false;
        }
        self.last = Some(hash);
        true
    }
}

/// JSON files under `root`, skipping hidden entries below it
fn collect_json(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && ContentWatcher::is_content_file(e.path()))
        .map(|e| e.into_path())
        .collect()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_content_file() {
        assert!(ContentWatcher::is_content_file(Path::new("content.json")));
        assert!(ContentWatcher::is_content_file(Path::new("tables/table-3a.json")));
        assert!(!ContentWatcher::is_content_file(Path::new("report.html")));
        assert!(!ContentWatcher::is_content_file(Path::new("notes.json.swp")));
    }

    #[test]
    fn test_fingerprint_tracks_json_content_only() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("tables")).unwrap();
        fs::write(dir.path().join("content.json"), "{}").unwrap();
        fs::write(dir.path().join("tables/a.json"), "[]").unwrap();

        let mut fp = InputFingerprint::new();
        assert!(fp.changed(InputFingerprint::compute(dir.path())));
        assert!(!fp.changed(InputFingerprint::compute(dir.path())));

        fs::write(dir.path().join("report.html"), "<p>page</p>").unwrap();
        assert!(!fp.changed(InputFingerprint::compute(dir.path())));

        fs::write(dir.path().join("tables/a.json"), "[1]").unwrap();
        assert!(fp.changed(InputFingerprint::compute(dir.path())));
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let dir = TempDir::new().unwrap();
        let hash = InputFingerprint::compute(dir.path());
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_skips_hidden_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".cache")).unwrap();
        fs::write(dir.path().join("content.json"), "{}").unwrap();

        let mut fp = InputFingerprint::new();
        assert!(fp.changed(InputFingerprint::compute(dir.path())));

        fs::write(dir.path().join(".cache/state.json"), "{\"n\": 1}").unwrap();
        assert!(!fp.changed(InputFingerprint::compute(dir.path())));
        assert_eq!(collect_json(dir.path()), vec![dir.path().join("content.json")]);
    }
}

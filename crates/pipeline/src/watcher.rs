//! Content watcher: discovery of newly downloaded content units.
//!
//! The platform materializes each content unit as a marker file plus a data
//! file. Creation notifications for the data file are unreliable on at
//! least one target OS, but the marker file reliably fires — so the watcher
//! subscribes to marker creations and derives the data path from the marker
//! path.

use std::fs;
use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Derive the data path from a marker path.
///
/// Every occurrence of the marker substring in the path is substituted; in
/// the platform's cache layout the marker name only ever appears as the
/// final component.
pub(crate) fn derive_data_path(marker_path: &Path, marker: &str, data: &str) -> PathBuf {
    PathBuf::from(marker_path.to_string_lossy().replace(marker, data))
}

/// Watches the content root for marker-file creations and emits the derived
/// data paths on the discovery channel.
pub struct ContentWatcher {
    content_root: PathBuf,
    marker_name: String,
    data_name: String,
    /// Active filesystem watcher (held to keep it alive).
    _watcher: Option<RecommendedWatcher>,
}

impl ContentWatcher {
    pub fn new(content_root: PathBuf, marker_name: String, data_name: String) -> Self {
        Self {
            content_root,
            marker_name,
            data_name,
            _watcher: None,
        }
    }

    /// Enqueue pre-existing content, then watch for new creations.
    ///
    /// The initial scan covers units downloaded while the pipeline was not
    /// running; the patcher's backup marker keeps re-discovery idempotent.
    pub fn start(&mut self, tx: mpsc::UnboundedSender<PathBuf>) -> Result<(), notify::Error> {
        let root = self.content_root.clone();
        self.scan_existing(&root, &tx);

        let marker = self.marker_name.clone();
        let data = self.data_name.clone();
        let mut watcher = notify::recommended_watcher(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => handle_fs_event(&event, &marker, &data, &tx),
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            },
        )?;

        watcher.watch(&self.content_root, RecursiveMode::Recursive)?;
        info!(path = %self.content_root.display(), "watching content root (recursive)");
        self._watcher = Some(watcher);
        Ok(())
    }

    fn scan_existing(&self, dir: &Path, tx: &mpsc::UnboundedSender<PathBuf>) {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n,
                None => continue,
            };
            if name.starts_with('.') {
                continue;
            }
            if path.is_dir() {
                self.scan_existing(&path, tx);
            } else if name == self.marker_name {
                let data_path = derive_data_path(&path, &self.marker_name, &self.data_name);
                info!(data = %data_path.display(), "pre-existing content unit");
                let _ = tx.send(data_path);
            }
        }
    }
}

fn handle_fs_event(
    event: &Event,
    marker: &str,
    data: &str,
    tx: &mpsc::UnboundedSender<PathBuf>,
) {
    if !matches!(event.kind, EventKind::Create(_)) {
        return;
    }
    for path in &event.paths {
        let is_marker = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n == marker)
            .unwrap_or(false);
        if !is_marker {
            continue;
        }
        let data_path = derive_data_path(path, marker, data);
        info!(marker = %path.display(), data = %data_path.display(), "content unit discovered");
        if tx.send(data_path).is_err() {
            warn!("discovery channel closed, dropping event");
        }
    }
}

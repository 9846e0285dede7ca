//! Load-state tracker: tails the client log and drives the patch gate.
//!
//! The client appends to a plain-text log file in a known directory; the
//! newest file (by creation timestamp) is the active one. A line containing
//! the load-start marker closes the gate, a line containing the load-stop
//! marker opens it, and the appearance of a newer log file means the client
//! restarted — a restart cannot be mid-load, so the gate reopens
//! unconditionally.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::Notify;
use tracing::{info, warn};

use crate::gate::PatchGate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Idle,
    Loading,
}

/// Tail over one log file: shared read, attached at end-of-file.
struct Tail {
    path: PathBuf,
    reader: BufReader<File>,
}

impl Tail {
    fn attach(path: &Path) -> io::Result<Self> {
        let mut file = File::open(path)?;
        // Prior history is irrelevant; only new transitions matter.
        file.seek(SeekFrom::End(0))?;
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
        })
    }

    /// Next complete line, or `None` once caught up.
    ///
    /// A trailing fragment without a newline is still being written;
    /// rewind so the whole line is re-read on the next poll.
    fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line)?;
        if n == 0 {
            return Ok(None);
        }
        if !line.ends_with('\n') {
            self.reader.seek_relative(-(n as i64))?;
            return Ok(None);
        }
        Ok(Some(line))
    }
}

pub struct LoadStateTracker {
    log_dir: PathBuf,
    extension: String,
    start_marker: String,
    stop_marker: String,
    poll_interval: Duration,
    gate: Arc<PatchGate>,
}

impl LoadStateTracker {
    pub fn new(
        log_dir: PathBuf,
        extension: String,
        start_marker: String,
        stop_marker: String,
        poll_interval: Duration,
        gate: Arc<PatchGate>,
    ) -> Self {
        Self {
            log_dir,
            extension,
            start_marker,
            stop_marker,
            poll_interval,
            gate,
        }
    }

    /// Newest log file by creation timestamp, falling back to modification
    /// time where the filesystem does not report creation time.
    pub(crate) fn newest_log(&self) -> Option<PathBuf> {
        let entries = fs::read_dir(&self.log_dir).ok()?;
        let mut best: Option<(SystemTime, PathBuf)> = None;

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let matches_ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == self.extension)
                .unwrap_or(false);
            if !matches_ext {
                continue;
            }
            let meta = match entry.metadata() {
                Ok(m) => m,
                Err(_) => continue,
            };
            let stamp = match meta.created().or_else(|_| meta.modified()) {
                Ok(s) => s,
                Err(_) => continue,
            };
            if best.as_ref().map(|(b, _)| stamp > *b).unwrap_or(true) {
                best = Some((stamp, path));
            }
        }

        best.map(|(_, path)| path)
    }

    /// Apply one log line to the state machine.
    pub(crate) fn apply_line(&self, state: &mut LoadState, line: &str) {
        if line.contains(&self.start_marker) {
            if *state != LoadState::Loading {
                info!("world load started, closing patch gate");
                *state = LoadState::Loading;
                self.gate.close();
            }
        } else if line.contains(&self.stop_marker) {
            if *state != LoadState::Idle {
                info!("world load finished, opening patch gate");
                *state = LoadState::Idle;
                self.gate.open();
            }
        }
    }

    /// Tail the active log until shutdown.
    pub async fn run(&self, shutdown: Arc<Notify>) {
        let mut state = LoadState::Idle;
        let mut attached: Option<Tail> = None;
        // Register interest up front so a notification sent while the loop
        // is between awaits is not lost.
        let notified = shutdown.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        loop {
            if let Some(newest) = self.newest_log() {
                let switch = attached
                    .as_ref()
                    .map(|tail| tail.path != newest)
                    .unwrap_or(true);
                if switch {
                    let had_previous = attached.is_some();
                    match Tail::attach(&newest) {
                        Ok(tail) => {
                            info!(path = %newest.display(), "tailing log file");
                            attached = Some(tail);
                            if had_previous {
                                // Client restart: cannot be mid-load.
                                info!("newer log file detected, forcing idle");
                                state = LoadState::Idle;
                                self.gate.open();
                            }
                        }
                        Err(e) => {
                            warn!(path = %newest.display(), error = %e, "failed to open log file")
                        }
                    }
                }
            }

            if let Some(tail) = attached.as_mut() {
                loop {
                    match tail.next_line() {
                        Ok(Some(line)) => self.apply_line(&mut state, &line),
                        Ok(None) => break,
                        Err(e) => {
                            warn!(path = %tail.path.display(), error = %e, "log read error");
                            break;
                        }
                    }
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = notified.as_mut() => break,
            }
        }
    }
}

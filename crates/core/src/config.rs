use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env_opt(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

/// Pipeline configuration, built from environment variables.
///
/// Every field has a `WARDEN_*` env key; the worker binary layers CLI
/// overrides on top of this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of the client's downloaded-content cache (watched recursively).
    pub content_root: PathBuf,
    /// Directory holding the client's plain-text log files.
    pub log_dir: PathBuf,
    /// Directory holding maintainer blocklist definition files.
    pub blocklist_dir: PathBuf,
    /// Where the content index is persisted as JSON.
    pub index_path: PathBuf,
    /// When true, matching and logging run but no asset file is written.
    pub dry_run: bool,
    /// File name the platform reliably creates alongside each data file.
    pub marker_name: String,
    /// Substring substituted for the marker name to reach the data file.
    pub data_name: String,
    /// Extension of the client's log files.
    pub log_extension: String,
    /// Line substring that marks the start of a world load.
    pub load_start_marker: String,
    /// Line substring that marks the end of a world load.
    pub load_stop_marker: String,
    /// Delay between retries of an incomplete (still-flushing) data file.
    pub retry_delay: Duration,
    /// Interval between content-index flushes.
    pub persist_interval: Duration,
    /// Upper bound on how long a patch task waits for the gate to open.
    pub gate_wait_timeout: Duration,
    /// Poll interval of the log tailer.
    pub log_poll_interval: Duration,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            content_root: env_or("WARDEN_CONTENT_ROOT", "cache").into(),
            log_dir: env_or("WARDEN_LOG_DIR", "logs").into(),
            blocklist_dir: env_or("WARDEN_BLOCKLIST_DIR", "blocklists").into(),
            index_path: env_or("WARDEN_INDEX_PATH", "content-index.json").into(),
            dry_run: env_bool("WARDEN_DRY_RUN", false),
            marker_name: env_or("WARDEN_MARKER_NAME", "__info"),
            data_name: env_or("WARDEN_DATA_NAME", "__data"),
            log_extension: env_or("WARDEN_LOG_EXT", "txt"),
            load_start_marker: env_or("WARDEN_LOAD_START_MARKER", "Joining wrld_"),
            load_stop_marker: env_or("WARDEN_LOAD_STOP_MARKER", "Finished entering world"),
            retry_delay: Duration::from_millis(env_u64("WARDEN_RETRY_DELAY_MS", 500)),
            persist_interval: Duration::from_secs(env_u64("WARDEN_PERSIST_INTERVAL_SECS", 300)),
            gate_wait_timeout: Duration::from_secs(env_u64("WARDEN_GATE_TIMEOUT_SECS", 600)),
            log_poll_interval: Duration::from_millis(env_u64("WARDEN_LOG_POLL_MS", 250)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

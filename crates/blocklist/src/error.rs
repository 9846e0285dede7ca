//! Error types and load result structures for the blocklist compiler.

use std::path::PathBuf;

/// Errors that can occur while loading definition files.
#[derive(Debug, thiserror::Error)]
pub enum BlocklistError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/deserialization error.
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Definition validation error (empty world id, no block entries, ...).
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result alias for blocklist operations.
pub type Result<T> = std::result::Result<T, BlocklistError>;

/// Outcome of loading a single definition file.
#[derive(Debug)]
pub struct LoadResult {
    /// Path to the file that was loaded.
    pub path: PathBuf,
    /// Status of the load attempt.
    pub status: LoadStatus,
}

/// Status of a single file load attempt.
#[derive(Debug)]
pub enum LoadStatus {
    /// File parsed and merged into the compiled set.
    Loaded { worlds: usize, objects: usize },
    /// File was skipped (dotfile, non-YAML, etc.).
    Skipped { reason: String },
    /// Parse or validation error occurred.
    Failed { error: String },
}

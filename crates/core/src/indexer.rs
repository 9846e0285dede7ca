//! Boundary trait for resolving data files into content records.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::record::ContentRecord;

/// Errors surfaced by a [`ContentIndexer`].
#[derive(Debug, Error)]
pub enum IndexError {
    /// The data file ends early because the downloader is still flushing it.
    /// Retryable with a fixed delay.
    #[error("incomplete file: {0}")]
    Incomplete(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl IndexError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, IndexError::Incomplete(_))
    }
}

/// Trait for the asset-format collaborator that understands data files.
///
/// Implementations own the specifics of the serialized scene format; the
/// pipeline only sees records or a definitive "not content".
#[async_trait]
pub trait ContentIndexer: Send + Sync {
    /// Resolve a discovered data file into a [`ContentRecord`].
    ///
    /// Returns `Ok(None)` when the file is readable but not relevant
    /// content (nothing further happens for it). An [`IndexError::Incomplete`]
    /// means the writer has not finished and the caller should retry.
    async fn parse_file(&self, path: &Path) -> Result<Option<ContentRecord>, IndexError>;
}

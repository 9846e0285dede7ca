use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file ends before the container does — the downloader is still
    /// flushing it. Retryable.
    #[error("incomplete bundle: {0}")]
    Incomplete(String),

    /// The file is complete but is not a bundle this store understands.
    #[error("codec error: {0}")]
    Codec(String),
}

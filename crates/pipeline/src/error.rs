use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("core error: {0}")]
    Core(#[from] warden_core::CoreError),

    #[error("blocklist error: {0}")]
    Blocklist(#[from] warden_blocklist::BlocklistError),

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

pub mod config;
pub mod error;
pub mod index;
pub mod indexer;
pub mod record;

pub use config::Config;
pub use error::CoreError;
pub use index::ContentIndex;
pub use indexer::{ContentIndexer, IndexError};
pub use record::{ContentId, ContentKind, ContentRecord};

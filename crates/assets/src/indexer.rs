//! [`ContentIndexer`] implementation backed by an [`AssetStore`].

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use warden_core::{ContentIndexer, ContentRecord, IndexError};

use crate::error::AssetError;
use crate::store::AssetStore;

/// Resolves data files by reading the bundle header through the store.
pub struct BundleIndexer {
    store: Arc<dyn AssetStore>,
}

impl BundleIndexer {
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ContentIndexer for BundleIndexer {
    async fn parse_file(&self, path: &Path) -> Result<Option<ContentRecord>, IndexError> {
        match self.store.load(path) {
            Ok(bundle) => Ok(Some(ContentRecord::new(
                bundle.content_id(),
                bundle.content_kind(),
                path,
            ))),
            Err(AssetError::Incomplete(e)) => Err(IndexError::Incomplete(e)),
            Err(AssetError::Codec(e)) => {
                // Complete but not a bundle: definitively not content.
                debug!(path = %path.display(), error = %e, "not a scene bundle");
                Ok(None)
            }
            Err(AssetError::Io(e)) => Err(IndexError::Io(e)),
        }
    }
}

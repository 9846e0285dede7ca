//! Reference JSON container codec.
//!
//! A bundle is a single JSON document: header identity plus the
//! scene-object table. Serialization is deterministic, so an unchanged
//! bundle round-trips to identical bytes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use warden_core::ContentKind;

use crate::error::AssetError;
use crate::store::{AssetBundle, AssetStore, SceneObject};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BundleDoc {
    id: String,
    kind: ContentKind,
    objects: Vec<SceneObject>,
}

/// In-memory bundle backed by the JSON container.
pub struct JsonBundle {
    doc: BundleDoc,
}

impl AssetBundle for JsonBundle {
    fn content_id(&self) -> &str {
        &self.doc.id
    }

    fn content_kind(&self) -> ContentKind {
        self.doc.kind.clone()
    }

    fn objects(&self) -> &[SceneObject] {
        &self.doc.objects
    }

    fn set_active(&mut self, index: usize, active: bool) {
        if let Some(obj) = self.doc.objects.get_mut(index) {
            obj.active = active;
        }
    }

    fn write(&self, path: &Path) -> Result<(), AssetError> {
        let json = serde_json::to_string_pretty(&self.doc)
            .map_err(|e| AssetError::Codec(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Store backend for the JSON container codec.
#[derive(Debug, Default, Clone)]
pub struct JsonAssetStore;

impl JsonAssetStore {
    pub fn new() -> Self {
        Self
    }
}

impl AssetStore for JsonAssetStore {
    fn load(&self, path: &Path) -> Result<Box<dyn AssetBundle>, AssetError> {
        let contents = fs::read_to_string(path)?;
        match serde_json::from_str::<BundleDoc>(&contents) {
            Ok(doc) => Ok(Box::new(JsonBundle { doc })),
            // A document that ends mid-stream is still being flushed by the
            // downloader; anything else malformed is simply not a bundle.
            Err(e) if e.is_eof() => Err(AssetError::Incomplete(e.to_string())),
            Err(e) => Err(AssetError::Codec(e.to_string())),
        }
    }
}

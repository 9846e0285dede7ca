//! Trait seams over the opaque scene-bundle format.

use std::path::Path;

use serde::{Deserialize, Serialize};

use warden_core::ContentKind;

use crate::error::AssetError;

/// One scene object as the patcher sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    pub active: bool,
    /// Local position, single precision as the engine stores it.
    pub local_position: [f32; 3],
    /// Index of the transform father in the bundle's object table.
    #[serde(default)]
    pub parent: Option<usize>,
}

/// A loaded scene bundle: header identity plus the scene-object table.
pub trait AssetBundle: Send {
    /// Platform content id from the bundle header.
    fn content_id(&self) -> &str;

    /// Content kind from the bundle header.
    fn content_kind(&self) -> ContentKind;

    /// Scene objects in bundle order. Father references index into this
    /// slice.
    fn objects(&self) -> &[SceneObject];

    /// Clear or set the active flag of the object at `index`.
    fn set_active(&mut self, index: usize, active: bool);

    /// Serialize the (possibly mutated) bundle to a new file.
    fn write(&self, path: &Path) -> Result<(), AssetError>;
}

/// Backend that knows how to read a serialized scene bundle from disk.
pub trait AssetStore: Send + Sync {
    fn load(&self, path: &Path) -> Result<Box<dyn AssetBundle>, AssetError>;
}

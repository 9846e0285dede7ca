//! YAML definition-file schema with serde deserialization.
//!
//! Keys are PascalCase as the maintainers write them. A definition file
//! carries optional descriptive metadata plus per-world block entries.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// One maintainer-authored definition file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlocklistFile {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub maintainer: Option<String>,
    pub blocks: Vec<BlockEntry>,
}

/// Block entries for a single world.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockEntry {
    #[serde(default)]
    pub friendly_name: Option<String>,
    pub world_id: String,
    pub game_objects: Vec<GameObjectInstance>,
}

/// A scene object to deactivate.
///
/// `name` alone matches every active object with that name. When several
/// objects share a name, optional `position` and `parent` constraints
/// disambiguate. `parent` is an owned recursive value describing the
/// required ancestor, finite and acyclic by construction from the file
/// format.
///
/// Equality is structural over (name, position, parent); it drives set
/// deduplication during compilation and the name-only match rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "PascalCase")]
pub struct GameObjectInstance {
    pub name: String,
    #[serde(default)]
    pub position: Option<GameObjectPosition>,
    #[serde(default)]
    pub parent: Option<Box<GameObjectInstance>>,
}

impl GameObjectInstance {
    /// True when neither position nor parent constrains the match.
    pub fn is_name_only(&self) -> bool {
        self.position.is_none() && self.parent.is_none()
    }
}

/// A local position, stored at double precision in the definition file.
///
/// The file format cannot represent single precision faithfully, so live
/// comparisons narrow the configured value to `f32` first (see
/// [`matches_live`](Self::matches_live)).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GameObjectPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl GameObjectPosition {
    /// Compare against a live single-precision position.
    ///
    /// Each configured component is narrowed `f64 → f32` and compared for
    /// exact equality with the corresponding live component.
    pub fn matches_live(&self, live: [f32; 3]) -> bool {
        self.x as f32 == live[0] && self.y as f32 == live[1] && self.z as f32 == live[2]
    }
}

// Structural equality over the raw bit patterns: values parsed from
// identical text are bit-identical, which is what set deduplication needs.
impl PartialEq for GameObjectPosition {
    fn eq(&self, other: &Self) -> bool {
        self.x.to_bits() == other.x.to_bits()
            && self.y.to_bits() == other.y.to_bits()
            && self.z.to_bits() == other.z.to_bits()
    }
}

impl Eq for GameObjectPosition {}

impl Hash for GameObjectPosition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.x.to_bits());
        state.write_u64(self.y.to_bits());
        state.write_u64(self.z.to_bits());
    }
}

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform content identifier (e.g. `wrld_<uuid>` for worlds).
pub type ContentId = String;

/// Kind of a downloaded content unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    World,
    Avatar,
    /// Anything else the platform caches (shaders, plugins, ...).
    Other(String),
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::World => write!(f, "World"),
            ContentKind::Avatar => write!(f, "Avatar"),
            ContentKind::Other(s) => write!(f, "Other({})", s),
        }
    }
}

/// One discovered content unit, created by the indexer per data file.
///
/// Appended to the shared [`ContentIndex`](crate::index::ContentIndex) on
/// discovery; `patched_at` is set in place after a successful patch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: ContentId,
    pub kind: ContentKind,
    pub path: PathBuf,
    pub discovered_at: DateTime<Utc>,
    #[serde(default)]
    pub patched_at: Option<DateTime<Utc>>,
}

impl ContentRecord {
    pub fn new(id: impl Into<ContentId>, kind: ContentKind, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            kind,
            path: path.into(),
            discovered_at: Utc::now(),
            patched_at: None,
        }
    }

    pub fn is_world(&self) -> bool {
        self.kind == ContentKind::World
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serde_roundtrip() {
        let rec = ContentRecord::new("wrld_abc", ContentKind::World, "/cache/ab/1/__data");
        let json = serde_json::to_string(&rec).unwrap();
        let back: ContentRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "wrld_abc");
        assert_eq!(back.kind, ContentKind::World);
        assert!(back.patched_at.is_none());
    }

    #[test]
    fn kind_display() {
        assert_eq!(ContentKind::World.to_string(), "World");
        assert_eq!(ContentKind::Other("shader".into()).to_string(), "Other(shader)");
    }
}

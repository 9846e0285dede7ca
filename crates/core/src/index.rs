//! Shared content index with synchronized accessors and JSON persistence.

use std::fs;
use std::path::Path;
use std::sync::RwLock;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::CoreError;
use crate::record::ContentRecord;

/// Append-only index of every content unit the pipeline has discovered.
///
/// The record list is interior-locked; callers never see the raw storage,
/// only snapshots and targeted mutations.
pub struct ContentIndex {
    records: RwLock<Vec<ContentRecord>>,
}

impl ContentIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Load a previously persisted index; a missing file yields an empty index.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let contents = fs::read_to_string(path)?;
        let records: Vec<ContentRecord> = serde_json::from_str(&contents)?;
        info!(path = %path.display(), records = records.len(), "loaded content index");
        Ok(Self {
            records: RwLock::new(records),
        })
    }

    /// Append a record unless its id is already indexed.
    ///
    /// Returns `false` (and leaves the index untouched) for a duplicate id.
    pub fn append(&self, record: ContentRecord) -> bool {
        let mut records = self.records.write().expect("index lock poisoned");
        if records.iter().any(|r| r.id == record.id) {
            return false;
        }
        records.push(record);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records
            .read()
            .expect("index lock poisoned")
            .iter()
            .any(|r| r.id == id)
    }

    pub fn get(&self, id: &str) -> Option<ContentRecord> {
        self.records
            .read()
            .expect("index lock poisoned")
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Stamp a record as patched. Unknown ids are logged and ignored.
    pub fn mark_patched(&self, id: &str) {
        let mut records = self.records.write().expect("index lock poisoned");
        match records.iter_mut().find(|r| r.id == id) {
            Some(rec) => rec.patched_at = Some(Utc::now()),
            None => warn!(id = %id, "mark_patched on unindexed record"),
        }
    }

    /// Clone of the current record list.
    pub fn snapshot(&self) -> Vec<ContentRecord> {
        self.records.read().expect("index lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().expect("index lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Persist the index as JSON.
    ///
    /// Writes to a `.tmp` sibling first, then renames to the final path to
    /// avoid partial writes on crash.
    pub fn write_to_disk(&self, path: &Path) -> Result<(), CoreError> {
        let snapshot = self.snapshot();
        let json = serde_json::to_string_pretty(&snapshot)?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path)?;

        info!(path = %path.display(), records = snapshot.len(), "flushed content index");
        Ok(())
    }
}

impl Default for ContentIndex {
    fn default() -> Self {
        Self::new()
    }
}

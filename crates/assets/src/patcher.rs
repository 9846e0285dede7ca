//! Blocklist matcher/patcher over a loaded bundle.
//!
//! Decides which currently-active scene objects match the per-world target
//! set, deactivates them, and replaces the asset file in a way a concurrent
//! reader survives: write to a temporary sibling, rename the original to
//! the backup path, rename the temporary over the original. The backup file
//! doubles as the already-patched marker.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use warden_blocklist::GameObjectInstance;

use crate::error::AssetError;
use crate::store::{AssetStore, SceneObject};

/// Result of one patch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// Backup file already present; the asset was not even opened.
    AlreadyPatched,
    /// No active object matched any target; nothing written.
    Clean,
    /// Objects were deactivated and the file was replaced.
    Patched { disabled: usize },
    /// Dry-run: matching ran, nothing was written, no backup created.
    DryRun { matched: usize },
}

pub struct BundlePatcher {
    store: Arc<dyn AssetStore>,
    dry_run: bool,
}

impl BundlePatcher {
    pub fn new(store: Arc<dyn AssetStore>, dry_run: bool) -> Self {
        Self { store, dry_run }
    }

    /// Backup path for an asset file: the file name with `.bak` appended.
    pub fn backup_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(".bak");
        path.with_file_name(name)
    }

    /// Apply the per-world target set to one asset file.
    pub fn patch(
        &self,
        path: &Path,
        targets: &HashSet<GameObjectInstance>,
    ) -> Result<PatchOutcome, AssetError> {
        let backup = Self::backup_path(path);
        if backup.exists() {
            debug!(path = %path.display(), "backup present, already patched");
            return Ok(PatchOutcome::AlreadyPatched);
        }

        let mut bundle = self.store.load(path)?;
        // Snapshot the table: father lookups need a stable view while the
        // active flags are mutated.
        let objects = bundle.objects().to_vec();

        let mut matched = Vec::new();
        for (index, obj) in objects.iter().enumerate() {
            if !obj.active {
                continue;
            }
            if Self::find_match(obj, &objects, targets) {
                info!(
                    path = %path.display(),
                    object = %obj.name,
                    position = ?obj.local_position,
                    "blocklisted object matched"
                );
                matched.push(index);
            }
        }

        if matched.is_empty() {
            return Ok(PatchOutcome::Clean);
        }

        for &index in &matched {
            bundle.set_active(index, false);
        }

        if self.dry_run {
            info!(path = %path.display(), matched = matched.len(), "dry-run: skipping write");
            return Ok(PatchOutcome::DryRun {
                matched: matched.len(),
            });
        }

        // Replace, never copy-then-delete: the client may be reading this
        // path concurrently.
        let tmp = path.with_extension("patched.tmp");
        bundle.write(&tmp)?;
        fs::rename(path, &backup)?;
        fs::rename(&tmp, path)?;

        info!(path = %path.display(), disabled = matched.len(), "patched asset");
        Ok(PatchOutcome::Patched {
            disabled: matched.len(),
        })
    }

    /// Whether any target claims this object.
    ///
    /// A position mismatch rejects only the current target and the scan
    /// continues; a parent mismatch rejects the object outright.
    fn find_match(
        obj: &SceneObject,
        all: &[SceneObject],
        targets: &HashSet<GameObjectInstance>,
    ) -> bool {
        for target in targets {
            if target.name != obj.name {
                continue;
            }

            if let Some(pos) = &target.position {
                if !pos.matches_live(obj.local_position) {
                    // Same name, wrong spot: try the remaining targets.
                    continue;
                }
            }

            if let Some(parent) = &target.parent {
                let father = obj.parent.and_then(|i| all.get(i));
                let father_ok = match father {
                    Some(f) if f.name == parent.name => match &parent.position {
                        Some(ppos) => ppos.matches_live(f.local_position),
                        None => true,
                    },
                    _ => false,
                };
                if !father_ok {
                    return false;
                }
            }

            return true;
        }
        false
    }
}

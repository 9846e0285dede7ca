//! Filesystem-backed blocklist compilation.
//!
//! Scans a directory (recursively) for `*.yml` / `*.yaml` definition files,
//! deserializes each independently, and unions them per world id into a
//! deduplicated target set.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{BlocklistError, LoadResult, LoadStatus, Result};
use crate::schema::{BlocklistFile, GameObjectInstance};

/// Compiled mapping world id → deduplicated target set.
///
/// Built once at startup, read-only thereafter; reload builds a fresh value
/// the owner swaps in atomically.
#[derive(Debug, Default)]
pub struct CompiledBlocklist {
    worlds: HashMap<String, HashSet<GameObjectInstance>>,
}

impl CompiledBlocklist {
    /// Target set for a world, if any maintainer listed it.
    pub fn targets(&self, world_id: &str) -> Option<&HashSet<GameObjectInstance>> {
        self.worlds.get(world_id)
    }

    pub fn world_count(&self) -> usize {
        self.worlds.len()
    }

    pub fn object_count(&self) -> usize {
        self.worlds.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }

    fn merge_entry(&mut self, world_id: String, objects: Vec<GameObjectInstance>) {
        self.worlds.entry(world_id).or_default().extend(objects);
    }
}

/// Loads every definition file from a configured directory.
///
/// Re-invokable: each [`compile`](Self::compile) call produces a fresh
/// [`CompiledBlocklist`], so the caller can swap an old mapping for a new
/// one to support reload.
pub struct BlocklistCompiler {
    /// Root directory containing definition YAML files.
    blocklist_dir: PathBuf,
}

impl BlocklistCompiler {
    /// Create a new compiler for the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist.
    pub fn new(blocklist_dir: PathBuf) -> Self {
        if !blocklist_dir.exists() {
            if let Err(e) = fs::create_dir_all(&blocklist_dir) {
                warn!(path = %blocklist_dir.display(), error = %e, "failed to create blocklist directory");
            }
        }
        Self { blocklist_dir }
    }

    /// Scan the directory and compile all definition files.
    ///
    /// Dotfiles and non-YAML files are skipped; subdirectories are scanned
    /// recursively. A malformed file is reported per-file and never aborts
    /// the batch.
    pub fn compile(&self) -> Result<(CompiledBlocklist, Vec<LoadResult>)> {
        let mut compiled = CompiledBlocklist::default();
        let mut results = Vec::new();
        self.scan_dir_recursive(&self.blocklist_dir, &mut compiled, &mut results)?;
        info!(
            worlds = compiled.world_count(),
            objects = compiled.object_count(),
            files = results.len(),
            "compiled blocklist"
        );
        Ok((compiled, results))
    }

    fn scan_dir_recursive(
        &self,
        dir: &Path,
        compiled: &mut CompiledBlocklist,
        results: &mut Vec<LoadResult>,
    ) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };

        for entry in entries {
            let entry = entry?;
            let path = entry.path();

            // Skip dotfiles/dotdirs
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    if path.is_file() {
                        results.push(LoadResult {
                            path,
                            status: LoadStatus::Skipped {
                                reason: "dotfile".to_string(),
                            },
                        });
                    }
                    continue;
                }
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, compiled, results)?;
                continue;
            }

            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "yml" || e == "yaml")
                .unwrap_or(false);

            if !is_yaml {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a YAML file".to_string(),
                    },
                });
                continue;
            }

            match self.load_file(&path) {
                Ok(file) => {
                    let worlds = file.blocks.len();
                    let objects: usize = file.blocks.iter().map(|b| b.game_objects.len()).sum();
                    info!(
                        path = %path.display(),
                        title = %file.title.as_deref().unwrap_or("<untitled>"),
                        maintainer = %file.maintainer.as_deref().unwrap_or("<unknown>"),
                        worlds,
                        objects,
                        "loaded blocklist file"
                    );
                    for block in file.blocks {
                        compiled.merge_entry(block.world_id, block.game_objects);
                    }
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Loaded { worlds, objects },
                    });
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load blocklist file");
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Failed {
                            error: e.to_string(),
                        },
                    });
                }
            }
        }

        Ok(())
    }

    /// Parse and validate a single definition file.
    pub fn load_file(&self, path: &Path) -> Result<BlocklistFile> {
        let contents = fs::read_to_string(path)?;
        let file: BlocklistFile = serde_yaml::from_str(&contents)?;

        if file.blocks.is_empty() {
            return Err(BlocklistError::Validation(
                "definition file has no block entries".to_string(),
            ));
        }
        if let Some(block) = file.blocks.iter().find(|b| b.world_id.is_empty()) {
            return Err(BlocklistError::Validation(format!(
                "block entry '{}' has an empty WorldId",
                block.friendly_name.as_deref().unwrap_or("<unnamed>")
            )));
        }

        Ok(file)
    }

    /// Get the blocklist directory path.
    pub fn blocklist_dir(&self) -> &Path {
        &self.blocklist_dir
    }
}

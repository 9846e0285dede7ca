//! Per-file parse task: one unit of work per discovered data file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use warden_assets::{BundlePatcher, PatchOutcome};
use warden_blocklist::CompiledBlocklist;
use warden_core::{ContentIndex, ContentIndexer};

use crate::gate::PatchGate;

/// Terminal result of one unit of work, collected by the supervising loop.
#[derive(Debug)]
pub enum TaskOutcome {
    /// Objects were deactivated and the asset file replaced.
    Patched { disabled: usize },
    /// Dry-run: matching ran, nothing was written.
    DryRun { matched: usize },
    /// Parsed (and indexed) but nothing to patch.
    Clean,
    /// Nothing to do for this file.
    Skipped { reason: String },
    /// Worth requeueing later.
    Retryable { reason: String },
    /// This unit of work failed; the pipeline continues.
    Fatal { error: String },
}

/// Everything a parse task needs, snapshotted at spawn time.
pub struct TaskContext {
    pub indexer: Arc<dyn ContentIndexer>,
    pub patcher: Arc<BundlePatcher>,
    pub index: Arc<ContentIndex>,
    pub blocklist: Arc<CompiledBlocklist>,
    pub gate: Arc<PatchGate>,
    pub retry_delay: Duration,
    pub gate_wait_timeout: Duration,
}

/// Resolve one discovered data file end to end.
pub async fn run(ctx: TaskContext, path: PathBuf) -> TaskOutcome {
    // The downloader writes the data file in place; reading past its end
    // just means it is still flushing. Fixed delay, unbounded retry.
    let record = loop {
        match ctx.indexer.parse_file(&path).await {
            Ok(Some(record)) => break record,
            Ok(None) => {
                info!(path = %path.display(), "not relevant content");
                return TaskOutcome::Skipped {
                    reason: "not content".to_string(),
                };
            }
            Err(e) if e.is_retryable() => {
                debug!(path = %path.display(), error = %e, "incomplete file, retrying");
                sleep(ctx.retry_delay).await;
            }
            Err(e) => {
                return TaskOutcome::Fatal {
                    error: e.to_string(),
                }
            }
        }
    };

    let id = record.id.clone();
    let is_world = record.is_world();

    if ctx.index.append(record) {
        info!(id = %id, path = %path.display(), "indexed content unit");
    } else {
        // Duplicate discovery. A world that never got patched (e.g. a
        // requeued gate timeout) still falls through to the patch path;
        // everything else is done.
        let already_patched = ctx
            .index
            .get(&id)
            .map(|r| r.patched_at.is_some())
            .unwrap_or(false);
        if !is_world || already_patched {
            return TaskOutcome::Skipped {
                reason: format!("already indexed: {id}"),
            };
        }
    }

    if !is_world {
        return TaskOutcome::Clean;
    }
    let Some(targets) = ctx.blocklist.targets(&id) else {
        return TaskOutcome::Clean;
    };

    // The asset loader holds no exclusive lock while reading; an untimed
    // write risks truncating a bundle mid-load and crashing the client.
    if ctx
        .gate
        .wait_open_timeout(ctx.gate_wait_timeout)
        .await
        .is_err()
    {
        return TaskOutcome::Retryable {
            reason: "patch gate stayed closed".to_string(),
        };
    }

    match ctx.patcher.patch(&path, targets) {
        Ok(PatchOutcome::Patched { disabled }) => {
            ctx.index.mark_patched(&id);
            TaskOutcome::Patched { disabled }
        }
        Ok(PatchOutcome::DryRun { matched }) => TaskOutcome::DryRun { matched },
        Ok(PatchOutcome::AlreadyPatched) => TaskOutcome::Skipped {
            reason: "already patched".to_string(),
        },
        Ok(PatchOutcome::Clean) => TaskOutcome::Clean,
        Err(e) => TaskOutcome::Fatal {
            error: e.to_string(),
        },
    }
}

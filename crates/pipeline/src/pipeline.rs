//! Pipeline wiring and the supervising loop.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};

use warden_assets::{AssetStore, BundlePatcher};
use warden_blocklist::{BlocklistCompiler, CompiledBlocklist, LoadStatus};
use warden_core::{Config, ContentIndex, ContentIndexer};

use crate::error::PipelineError;
use crate::gate::PatchGate;
use crate::persist::PeriodicPersister;
use crate::task::{self, TaskContext, TaskOutcome};
use crate::tracker::LoadStateTracker;
use crate::watcher::ContentWatcher;

/// Owns the shared state (content index, compiled blocklist, patch gate)
/// and runs the supervising loop: one task per discovered file, outcomes
/// collected and logged, retryables requeued.
pub struct Pipeline {
    config: Config,
    index: Arc<ContentIndex>,
    blocklist: RwLock<Arc<CompiledBlocklist>>,
    gate: Arc<PatchGate>,
    indexer: Arc<dyn ContentIndexer>,
    patcher: Arc<BundlePatcher>,
}

impl Pipeline {
    /// Build the pipeline: load the persisted index, compile the blocklist.
    pub fn new(
        config: Config,
        indexer: Arc<dyn ContentIndexer>,
        store: Arc<dyn AssetStore>,
    ) -> Result<Self, PipelineError> {
        let index = match ContentIndex::load(&config.index_path) {
            Ok(index) => index,
            Err(e) => {
                warn!(path = %config.index_path.display(), error = %e, "failed to load persisted index, starting empty");
                ContentIndex::new()
            }
        };

        let compiled = Self::compile_blocklist(&config.blocklist_dir)?;
        let patcher = Arc::new(BundlePatcher::new(store, config.dry_run));

        Ok(Self {
            config,
            index: Arc::new(index),
            blocklist: RwLock::new(Arc::new(compiled)),
            gate: Arc::new(PatchGate::new()),
            indexer,
            patcher,
        })
    }

    fn compile_blocklist(dir: &Path) -> Result<CompiledBlocklist, PipelineError> {
        let (compiled, results) = BlocklistCompiler::new(dir.to_path_buf()).compile()?;
        let failed = results
            .iter()
            .filter(|r| matches!(r.status, LoadStatus::Failed { .. }))
            .count();
        if failed > 0 {
            warn!(failed, "some blocklist files failed to load");
        }
        Ok(compiled)
    }

    pub fn gate(&self) -> Arc<PatchGate> {
        self.gate.clone()
    }

    pub fn index(&self) -> Arc<ContentIndex> {
        self.index.clone()
    }

    /// Recompile the blocklist from disk and swap it in atomically.
    /// In-flight tasks keep the snapshot they started with.
    pub fn reload_blocklist(&self) -> Result<(), PipelineError> {
        let compiled = Self::compile_blocklist(&self.config.blocklist_dir)?;
        *self.blocklist.write().expect("blocklist lock poisoned") = Arc::new(compiled);
        info!("blocklist reloaded");
        Ok(())
    }

    fn blocklist_snapshot(&self) -> Arc<CompiledBlocklist> {
        self.blocklist.read().expect("blocklist lock poisoned").clone()
    }

    fn task_context(&self) -> TaskContext {
        TaskContext {
            indexer: self.indexer.clone(),
            patcher: self.patcher.clone(),
            index: self.index.clone(),
            blocklist: self.blocklist_snapshot(),
            gate: self.gate.clone(),
            retry_delay: self.config.retry_delay,
            gate_wait_timeout: self.config.gate_wait_timeout,
        }
    }

    /// Run watcher, tracker, persister and the supervising loop until
    /// `shutdown` is notified.
    pub async fn run(self: Arc<Self>, shutdown: Arc<Notify>) -> Result<(), PipelineError> {
        let (discovered_tx, mut discovered_rx) = mpsc::unbounded_channel::<PathBuf>();
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<(PathBuf, TaskOutcome)>();

        let mut watcher = ContentWatcher::new(
            self.config.content_root.clone(),
            self.config.marker_name.clone(),
            self.config.data_name.clone(),
        );
        watcher.start(discovered_tx.clone())?;

        let tracker = LoadStateTracker::new(
            self.config.log_dir.clone(),
            self.config.log_extension.clone(),
            self.config.load_start_marker.clone(),
            self.config.load_stop_marker.clone(),
            self.config.log_poll_interval,
            self.gate.clone(),
        );
        let tracker_handle = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { tracker.run(shutdown).await })
        };

        let persister = PeriodicPersister::new(
            self.index.clone(),
            self.config.index_path.clone(),
            self.config.persist_interval,
        );
        let persister_handle = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { persister.run(shutdown).await })
        };

        info!("pipeline running");
        // Register interest up front so a notification sent while an
        // outcome is being handled is not lost.
        let notified = shutdown.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        loop {
            tokio::select! {
                Some(path) = discovered_rx.recv() => {
                    let ctx = self.task_context();
                    let outcome_tx = outcome_tx.clone();
                    tokio::spawn(async move {
                        let outcome = task::run(ctx, path.clone()).await;
                        let _ = outcome_tx.send((path, outcome));
                    });
                }
                Some((path, outcome)) = outcome_rx.recv() => {
                    self.handle_outcome(path, outcome, &discovered_tx);
                }
                _ = notified.as_mut() => break,
            }
        }

        // Dropping the watcher stops discovery; the loops drain on their
        // own shutdown signal.
        drop(watcher);
        let _ = tokio::join!(tracker_handle, persister_handle);
        info!("pipeline stopped");
        Ok(())
    }

    fn handle_outcome(
        &self,
        path: PathBuf,
        outcome: TaskOutcome,
        requeue: &mpsc::UnboundedSender<PathBuf>,
    ) {
        match outcome {
            TaskOutcome::Patched { disabled } => {
                info!(path = %path.display(), disabled, "asset patched");
            }
            TaskOutcome::DryRun { matched } => {
                info!(path = %path.display(), matched, "dry-run match");
            }
            TaskOutcome::Clean => {
                debug!(path = %path.display(), "nothing to patch");
            }
            TaskOutcome::Skipped { reason } => {
                debug!(path = %path.display(), reason = %reason, "skipped");
            }
            TaskOutcome::Retryable { reason } => {
                warn!(path = %path.display(), reason = %reason, "requeueing");
                let requeue = requeue.clone();
                let delay = self.config.retry_delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = requeue.send(path);
                });
            }
            TaskOutcome::Fatal { error } => {
                warn!(path = %path.display(), error = %error, "task failed");
            }
        }
    }
}

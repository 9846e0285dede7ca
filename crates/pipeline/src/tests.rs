//! Task-level and end-to-end pipeline tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;

use warden_assets::{AssetStore, BundleIndexer, BundlePatcher, JsonAssetStore};
use warden_blocklist::{BlocklistCompiler, CompiledBlocklist};
use warden_core::{Config, ContentIndex};

use crate::gate::PatchGate;
use crate::persist::PeriodicPersister;
use crate::pipeline::Pipeline;
use crate::task::{self, TaskContext, TaskOutcome};

fn write_bundle(path: &Path, id: &str, kind: &str, objects: Vec<serde_json::Value>) {
    let doc = json!({ "id": id, "kind": kind, "objects": objects });
    fs::write(path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();
}

fn active_obj(name: &str) -> serde_json::Value {
    json!({ "name": name, "active": true, "local_position": [0.0, 0.0, 0.0], "parent": null })
}

/// Compile a single-world blocklist targeting `ParticleBomb` in `world_id`.
fn compiled_for(world_id: &str) -> Arc<CompiledBlocklist> {
    let dir = TempDir::new().unwrap();
    let yaml = format!(
        "Blocks:\n  - WorldId: {world_id}\n    GameObjects:\n      - Name: ParticleBomb\n"
    );
    fs::write(dir.path().join("list.yml"), yaml).unwrap();
    let (compiled, _) = BlocklistCompiler::new(dir.path().to_path_buf())
        .compile()
        .unwrap();
    Arc::new(compiled)
}

struct Fixture {
    index: Arc<ContentIndex>,
    gate: Arc<PatchGate>,
    blocklist: Arc<CompiledBlocklist>,
    store: Arc<dyn AssetStore>,
    dry_run: bool,
    gate_wait_timeout: Duration,
}

impl Fixture {
    fn new(world_id: &str) -> Self {
        Self {
            index: Arc::new(ContentIndex::new()),
            gate: Arc::new(PatchGate::new()),
            blocklist: compiled_for(world_id),
            store: Arc::new(JsonAssetStore::new()),
            dry_run: false,
            gate_wait_timeout: Duration::from_secs(5),
        }
    }

    fn ctx(&self) -> TaskContext {
        TaskContext {
            indexer: Arc::new(BundleIndexer::new(self.store.clone())),
            patcher: Arc::new(BundlePatcher::new(self.store.clone(), self.dry_run)),
            index: self.index.clone(),
            blocklist: self.blocklist.clone(),
            gate: self.gate.clone(),
            retry_delay: Duration::from_millis(20),
            gate_wait_timeout: self.gate_wait_timeout,
        }
    }
}

async fn wait_until(cond: impl Fn() -> bool) {
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while !cond() {
        if std::time::Instant::now() > deadline {
            panic!("condition not reached in time");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// ── Parse task ──────────────────────────────────────────────────────

#[tokio::test]
async fn world_task_blocks_on_closed_gate_until_opened() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("__data");
    write_bundle(&data, "wrld_gated", "World", vec![active_obj("ParticleBomb")]);

    let fixture = Fixture::new("wrld_gated");
    fixture.gate.close();

    let handle = tokio::spawn(task::run(fixture.ctx(), data.clone()));

    // The task must be parked on the gate, not patching.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!handle.is_finished());
    assert!(!BundlePatcher::backup_path(&data).exists());

    fixture.gate.open();
    let outcome = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("task finished")
        .unwrap();
    assert!(matches!(outcome, TaskOutcome::Patched { disabled: 1 }));
    assert!(BundlePatcher::backup_path(&data).exists());
}

#[tokio::test]
async fn incomplete_file_retries_until_writer_finishes() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("__data");
    // Truncated document: the downloader is mid-flush.
    fs::write(&data, r#"{"id": "wrld_slow", "kind": "Wor"#).unwrap();

    let fixture = Fixture::new("wrld_slow");
    let handle = tokio::spawn(task::run(fixture.ctx(), data.clone()));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!handle.is_finished(), "task should still be retrying");

    write_bundle(&data, "wrld_slow", "World", vec![active_obj("ParticleBomb")]);

    let outcome = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("task finished")
        .unwrap();
    assert!(matches!(outcome, TaskOutcome::Patched { disabled: 1 }));
}

#[tokio::test]
async fn gate_timeout_is_retryable_and_requeue_completes() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("__data");
    write_bundle(&data, "wrld_stuck", "World", vec![active_obj("ParticleBomb")]);

    let mut fixture = Fixture::new("wrld_stuck");
    fixture.gate_wait_timeout = Duration::from_millis(30);
    fixture.gate.close();

    let outcome = task::run(fixture.ctx(), data.clone()).await;
    assert!(matches!(outcome, TaskOutcome::Retryable { .. }));
    assert!(fixture.index.contains("wrld_stuck"));

    // Requeued attempt: already indexed but unpatched, so the task falls
    // through to the patch path once the gate opens.
    fixture.gate.open();
    let outcome = task::run(fixture.ctx(), data.clone()).await;
    assert!(matches!(outcome, TaskOutcome::Patched { disabled: 1 }));
    assert!(fixture.index.get("wrld_stuck").unwrap().patched_at.is_some());
}

#[tokio::test]
async fn duplicate_discovery_of_patched_world_is_skipped() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("__data");
    write_bundle(&data, "wrld_dup", "World", vec![active_obj("ParticleBomb")]);

    let fixture = Fixture::new("wrld_dup");
    let first = task::run(fixture.ctx(), data.clone()).await;
    assert!(matches!(first, TaskOutcome::Patched { .. }));

    let second = task::run(fixture.ctx(), data.clone()).await;
    assert!(matches!(second, TaskOutcome::Skipped { .. }));
    assert_eq!(fixture.index.len(), 1);
}

#[tokio::test]
async fn non_world_content_is_indexed_but_never_patched() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("__data");
    write_bundle(&data, "avtr_x", "Avatar", vec![active_obj("ParticleBomb")]);
    let original = fs::read(&data).unwrap();

    let fixture = Fixture::new("avtr_x");
    let outcome = task::run(fixture.ctx(), data.clone()).await;
    assert!(matches!(outcome, TaskOutcome::Clean));
    assert!(fixture.index.contains("avtr_x"));
    assert_eq!(fs::read(&data).unwrap(), original);
}

#[tokio::test]
async fn world_without_blocklist_entry_is_clean() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("__data");
    write_bundle(&data, "wrld_benign", "World", vec![active_obj("ParticleBomb")]);

    let fixture = Fixture::new("wrld_other");
    let outcome = task::run(fixture.ctx(), data.clone()).await;
    assert!(matches!(outcome, TaskOutcome::Clean));
    assert!(!BundlePatcher::backup_path(&data).exists());
}

#[tokio::test]
async fn foreign_file_is_skipped_and_not_indexed() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("__data");
    fs::write(&data, "not a bundle at all").unwrap();

    let fixture = Fixture::new("wrld_any");
    let outcome = task::run(fixture.ctx(), data.clone()).await;
    assert!(matches!(outcome, TaskOutcome::Skipped { .. }));
    assert!(fixture.index.is_empty());
}

// ── Periodic persister ──────────────────────────────────────────────

#[tokio::test]
async fn persister_flushes_on_interval() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("index.json");

    let index = Arc::new(ContentIndex::new());
    let persister = PeriodicPersister::new(index, path.clone(), Duration::from_millis(50));
    let shutdown = Arc::new(tokio::sync::Notify::new());
    let handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { persister.run(shutdown).await })
    };

    wait_until(|| path.exists()).await;

    shutdown.notify_waiters();
    let _ = tokio::time::timeout(Duration::from_secs(1), handle).await;
}

#[tokio::test]
async fn persister_flushes_once_more_on_shutdown() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("index.json");

    let index = Arc::new(ContentIndex::new());
    // Interval far beyond the test: only the shutdown flush can write.
    let persister = PeriodicPersister::new(index, path.clone(), Duration::from_secs(3600));
    let shutdown = Arc::new(tokio::sync::Notify::new());
    let handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { persister.run(shutdown).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!path.exists());

    shutdown.notify_waiters();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("persister stopped")
        .unwrap();
    assert!(path.exists());
}

// ── End to end ──────────────────────────────────────────────────────

fn test_config(root: &Path) -> Config {
    Config {
        content_root: root.join("cache"),
        log_dir: root.join("logs"),
        blocklist_dir: root.join("blocklists"),
        index_path: root.join("content-index.json"),
        dry_run: false,
        marker_name: "__info".to_string(),
        data_name: "__data".to_string(),
        log_extension: "txt".to_string(),
        load_start_marker: "Joining wrld_".to_string(),
        load_stop_marker: "Finished entering world".to_string(),
        retry_delay: Duration::from_millis(20),
        persist_interval: Duration::from_millis(100),
        gate_wait_timeout: Duration::from_secs(5),
        log_poll_interval: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn pipeline_patches_discovered_world_end_to_end() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let unit = config.content_root.join("ab").join("1");
    fs::create_dir_all(&unit).unwrap();
    let data = unit.join("__data");
    write_bundle(
        &data,
        "wrld_e2e",
        "World",
        vec![active_obj("ParticleBomb"), active_obj("Bystander")],
    );
    fs::write(unit.join("__info"), "meta").unwrap();

    fs::create_dir_all(&config.log_dir).unwrap();
    fs::write(config.log_dir.join("output.txt"), "").unwrap();

    fs::create_dir_all(&config.blocklist_dir).unwrap();
    fs::write(
        config.blocklist_dir.join("list.yml"),
        "Blocks:\n  - WorldId: wrld_e2e\n    GameObjects:\n      - Name: ParticleBomb\n",
    )
    .unwrap();

    let store: Arc<dyn AssetStore> = Arc::new(JsonAssetStore::new());
    let indexer = Arc::new(BundleIndexer::new(store.clone()));
    let index_path = config.index_path.clone();
    let pipeline = Arc::new(Pipeline::new(config, indexer, store.clone()).unwrap());

    let shutdown = Arc::new(tokio::sync::Notify::new());
    let handle = {
        let pipeline = pipeline.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { pipeline.run(shutdown).await })
    };

    // The startup scan discovers the pre-existing unit and patches it.
    let backup = BundlePatcher::backup_path(&data);
    wait_until(|| backup.exists()).await;

    let bundle = store.load(&data).unwrap();
    let states: Vec<_> = bundle
        .objects()
        .iter()
        .map(|o| (o.name.clone(), o.active))
        .collect();
    assert_eq!(states[0], ("ParticleBomb".to_string(), false));
    assert_eq!(states[1], ("Bystander".to_string(), true));

    shutdown.notify_waiters();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("pipeline stopped")
        .unwrap()
        .unwrap();

    // The shutdown flush persisted the patched record.
    let persisted = fs::read_to_string(&index_path).unwrap();
    assert!(persisted.contains("wrld_e2e"));
    let records: Vec<warden_core::ContentRecord> = serde_json::from_str(&persisted).unwrap();
    assert!(records[0].patched_at.is_some());
}

//! Activity loop tests against a real directory

use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

use recall_bridge::context::{ContextSampler, ContextSource};
use recall_bridge::memory::{InMemoryStore, MemoryGateway};
use recall_bridge::services::{ActivitySyncLoop, SyncOutcome};

#[tokio::test]
async fn test_run_once_twice_writes_once() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("main.py"), "print('hi')\n").unwrap();

    let store = Arc::new(InMemoryStore::new());
    let activity = ActivitySyncLoop::new(
        ContextSampler::new(dir.path()),
        MemoryGateway::new(store.clone()),
        Duration::from_secs(60),
    );

    assert_eq!(activity.run_once().await.unwrap(), SyncOutcome::Emitted);
    assert_eq!(activity.run_once().await.unwrap(), SyncOutcome::Unchanged);
    assert_eq!(store.write_count(), 1);

    let record = &store.records()[0];
    assert_eq!(record.metadata.kind(), "development_activity");
    assert!(record.content.contains("main.py"));
    assert!(record.content.contains("Git branch: N/A"));
}

#[tokio::test]
async fn test_new_file_triggers_another_write() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.rs"), "").unwrap();

    let store = Arc::new(InMemoryStore::new());
    let activity = ActivitySyncLoop::new(
        ContextSampler::new(dir.path()),
        MemoryGateway::new(store.clone()),
        Duration::from_secs(60),
    );

    activity.run_once().await.unwrap();
    fs::write(dir.path().join("b.rs"), "").unwrap();
    assert_eq!(activity.run_once().await.unwrap(), SyncOutcome::Emitted);
    assert_eq!(store.write_count(), 2);
}

#[tokio::test]
async fn test_loop_survives_store_outage() {
    let dir = tempdir().unwrap();
    let store = Arc::new(InMemoryStore::new().fail_when(|_| true));
    let activity = ActivitySyncLoop::new(
        ContextSampler::new(dir.path()),
        MemoryGateway::new(store.clone()),
        Duration::from_millis(10),
    );

    activity.start().await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(activity.is_running().await);
    activity.stop().await;

    assert!(!activity.is_running().await);
    assert_eq!(store.write_count(), 0);
}

#[test]
fn test_sampler_ignores_hidden_entries() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join(".cache")).unwrap();
    fs::write(dir.path().join(".cache").join("blob"), "").unwrap();
    fs::write(dir.path().join(".envrc"), "").unwrap();
    fs::write(dir.path().join("visible.txt"), "").unwrap();

    let snapshot = ContextSampler::new(dir.path()).sample();
    assert_eq!(snapshot.recent_files, vec!["visible.txt".to_string()]);
}

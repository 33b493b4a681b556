//! Activity Sync Loop
//!
//! Samples the developer context on a fixed interval and stores a summary
//! only when the context moved since the last stored one.

use anyhow::anyhow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::context::{ChangeDetector, ContextSnapshot, ContextSource};
use crate::error::Result;
use crate::memory::{MemoryGateway, RecordMetadata};

/// Default time `stop` waits for an in-flight cycle
pub const STOP_GRACE: Duration = Duration::from_secs(5);

const ACTIVITY_SOURCE: &str = "activity_monitor";
const LISTED_FILES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Emitted,
    Unchanged,
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct Cycle {
    source: Arc<dyn ContextSource>,
    gateway: MemoryGateway,
    detector: Mutex<ChangeDetector>,
}

pub struct ActivitySyncLoop {
    cycle: Arc<Cycle>,
    interval: Duration,
    stop_grace: Duration,
    running: Mutex<Option<Running>>,
}

/// Natural-language summary plus typed metadata for one snapshot
pub fn describe_activity(snapshot: &ContextSnapshot) -> (String, RecordMetadata) {
    let files = if snapshot.recent_files.is_empty() {
        "None".to_string()
    } else {
        snapshot
            .recent_files
            .iter()
            .take(LISTED_FILES)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    };
    let status = if snapshot.is_dirty().unwrap_or(false) {
        "Modified files"
    } else {
        "Clean"
    };
    let content = format!(
        "Development Activity Update:\n- Working in: {} ({})\n- Git branch: {}\n- Recent files: {}\n- Git status: {}\n- Time: {}",
        snapshot.project_name,
        snapshot.working_directory.display(),
        snapshot.branch().unwrap_or("N/A"),
        files,
        status,
        snapshot.timestamp.to_rfc3339()
    );
    let metadata = RecordMetadata::DevelopmentActivity {
        source: ACTIVITY_SOURCE.to_string(),
        project: Some(snapshot.project_name.clone()),
        git_branch: snapshot.branch().map(str::to_string),
        files: Vec::new(),
        timestamp: snapshot.timestamp,
    };
    (content, metadata)
}

impl Cycle {
    /// Sample, compare, and store on change. The detector lock is held for
    /// the whole cycle so two cycles never interleave.
    async fn run(&self) -> Result<SyncOutcome> {
        let mut detector = self.detector.lock().await;

        let source = self.source.clone();
        let snapshot = tokio::task::spawn_blocking(move || source.sample())
            .await
            .map_err(|e| anyhow!("context sampling task failed: {e}"))?;

        if !detector.has_changed(&snapshot) {
            debug!("No significant activity change, skipping sync");
            return Ok(SyncOutcome::Unchanged);
        }

        let (content, metadata) = describe_activity(&snapshot);
        self.gateway.record(content, metadata).await?;
        info!(
            "Activity synced: {} on {}",
            snapshot.project_name,
            snapshot.branch().unwrap_or("N/A")
        );
        detector.accept(snapshot);
        Ok(SyncOutcome::Emitted)
    }
}

impl ActivitySyncLoop {
    pub fn new(source: impl ContextSource, gateway: MemoryGateway, interval: Duration) -> Self {
        Self {
            cycle: Arc::new(Cycle {
                source: Arc::new(source),
                gateway,
                detector: Mutex::new(ChangeDetector::new()),
            }),
            interval,
            stop_grace: STOP_GRACE,
            running: Mutex::new(None),
        }
    }

    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Spawn the loop. Returns false if it was already running.
    pub async fn start(&self) -> bool {
        let mut running = self.running.lock().await;
        if running.is_some() {
            warn!("Activity monitor already running");
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_loop(self.cycle.clone(), self.interval, cancel.clone()));
        *running = Some(Running { cancel, handle });
        info!("Activity monitor started (interval {:?})", self.interval);
        true
    }

    /// Signal the loop and wait up to the grace period for it to exit
    pub async fn stop(&self) {
        let Some(Running { cancel, handle }) = self.running.lock().await.take() else {
            return;
        };
        cancel.cancel();
        match tokio::time::timeout(self.stop_grace, handle).await {
            Ok(Ok(())) => info!("Activity monitor stopped"),
            Ok(Err(e)) => error!("Activity monitor task failed: {}", e),
            Err(_) => warn!(
                "Activity monitor still finishing a cycle after {:?}; leaving it to complete",
                self.stop_grace
            ),
        }
    }

    /// One sample-check-emit cycle, regardless of whether the loop is running
    pub async fn run_once(&self) -> Result<SyncOutcome> {
        self.cycle.run().await
    }
}

async fn run_loop(cycle: Arc<Cycle>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = cycle.run().await {
                    error!("Error syncing activity: {}", e);
                }
            }
        }
    }
    debug!("Activity loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{EnvironmentFlags, VcsInfo};
    use crate::memory::InMemoryStore;
    use chrono::Utc;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Returns the same context every time, optionally on a different branch
    struct FixedSource {
        switched: Arc<AtomicBool>,
    }

    impl ContextSource for FixedSource {
        fn sample(&self) -> ContextSnapshot {
            let branch = if self.switched.load(Ordering::SeqCst) {
                "feature/login"
            } else {
                "main"
            };
            ContextSnapshot {
                working_directory: PathBuf::from("/work/api"),
                project_name: "api".to_string(),
                timestamp: Utc::now(),
                user: "dev".to_string(),
                shell: "/bin/bash".to_string(),
                recent_files: vec!["src/main.rs".to_string()],
                vcs: Some(VcsInfo {
                    branch: branch.to_string(),
                    last_commit: "abc fix".to_string(),
                    is_dirty: true,
                    modified_files: 1,
                }),
                environment: EnvironmentFlags::default(),
            }
        }
    }

    fn fixed() -> (FixedSource, Arc<AtomicBool>) {
        let switched = Arc::new(AtomicBool::new(false));
        (
            FixedSource {
                switched: switched.clone(),
            },
            switched,
        )
    }

    #[tokio::test]
    async fn test_run_once_emits_only_on_change() {
        let store = Arc::new(InMemoryStore::new());
        let (source, switched) = fixed();
        let activity = ActivitySyncLoop::new(source, MemoryGateway::new(store.clone()), Duration::from_secs(60));

        assert_eq!(activity.run_once().await.unwrap(), SyncOutcome::Emitted);
        assert_eq!(activity.run_once().await.unwrap(), SyncOutcome::Unchanged);
        assert_eq!(store.write_count(), 1);

        switched.store(true, Ordering::SeqCst);
        assert_eq!(activity.run_once().await.unwrap(), SyncOutcome::Emitted);
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_write_is_retried_next_cycle() {
        let fail = Arc::new(AtomicBool::new(true));
        let fail_rule = fail.clone();
        let store = Arc::new(InMemoryStore::new().fail_when(move |_| fail_rule.load(Ordering::SeqCst)));
        let (source, _) = fixed();
        let activity = ActivitySyncLoop::new(source, MemoryGateway::new(store.clone()), Duration::from_secs(60));

        assert!(activity.run_once().await.is_err());
        fail.store(false, Ordering::SeqCst);
        assert_eq!(activity.run_once().await.unwrap(), SyncOutcome::Emitted);
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_description_lists_five_files() {
        let (source, _) = fixed();
        let mut snapshot = source.sample();
        snapshot.recent_files = (0..8).map(|i| format!("f{i}.rs")).collect();

        let (content, metadata) = describe_activity(&snapshot);

        assert!(content.contains("f4.rs"));
        assert!(!content.contains("f5.rs"));
        assert!(content.contains("Git status: Modified files"));
        assert!(content.contains("Git branch: main"));
        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(value["type"], "development_activity");
        assert_eq!(value["source"], "activity_monitor");
        assert_eq!(value["project"], "api");
        assert_eq!(value["git_branch"], "main");
    }

    struct SlowSource {
        delay: Duration,
        inner: FixedSource,
    }

    impl ContextSource for SlowSource {
        fn sample(&self) -> ContextSnapshot {
            std::thread::sleep(self.delay);
            self.inner.sample()
        }
    }

    #[tokio::test]
    async fn test_stop_returns_after_grace_when_cycle_overruns() {
        let store = Arc::new(InMemoryStore::new());
        let (inner, _) = fixed();
        let source = SlowSource {
            delay: Duration::from_millis(600),
            inner,
        };
        let activity = ActivitySyncLoop::new(source, MemoryGateway::new(store.clone()), Duration::from_millis(10))
            .with_stop_grace(Duration::from_millis(50));

        assert!(activity.start().await);
        // Let the first tick reach the blocking sample
        tokio::time::sleep(Duration::from_millis(30)).await;

        let started = std::time::Instant::now();
        activity.stop().await;
        assert!(started.elapsed() < Duration::from_millis(400));
        assert!(!activity.is_running().await);

        // The abandoned cycle is not aborted and still lands its write
        tokio::time::sleep(Duration::from_millis(800)).await;
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_start_stop_lifecycle() {
        let store = Arc::new(InMemoryStore::new());
        let (source, _) = fixed();
        let activity = ActivitySyncLoop::new(source, MemoryGateway::new(store.clone()), Duration::from_millis(20));

        assert!(activity.start().await);
        assert!(!activity.start().await);
        assert!(activity.is_running().await);

        tokio::time::sleep(Duration::from_millis(100)).await;
        activity.stop().await;

        assert!(!activity.is_running().await);
        // Several ticks ran, but the context never changed after the first
        assert_eq!(store.write_count(), 1);

        activity.stop().await;
    }
}

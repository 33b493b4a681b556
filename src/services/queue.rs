//! Update Queue
//!
//! Bounded FIFO between the ingestion endpoint and the task-update processor.
//! A single worker drains it, so updates are processed in acceptance order.
//! When the buffer is full new updates are refused instead of piling up.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::processor::TaskUpdateProcessor;
use super::task::TaskUpdate;
use crate::error::{BridgeError, Result};

enum QueueCommand {
    Process(Box<TaskUpdate>),
    Shutdown,
}

pub struct UpdateQueue {
    sender: mpsc::Sender<QueueCommand>,
    capacity: usize,
    closed: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl UpdateQueue {
    /// Start the worker. Must be called inside a tokio runtime.
    pub fn spawn(processor: TaskUpdateProcessor, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let worker = tokio::spawn(run_worker(processor, receiver));
        Self {
            sender,
            capacity,
            closed: AtomicBool::new(false),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Updates accepted but not yet picked up by the worker
    pub fn pending(&self) -> usize {
        self.capacity - self.sender.capacity()
    }

    /// Enqueue without waiting; fails fast when full or shut down
    pub fn submit(&self, update: TaskUpdate) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BridgeError::QueueClosed);
        }
        self.sender
            .try_send(QueueCommand::Process(Box::new(update)))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => BridgeError::QueueFull {
                    capacity: self.capacity,
                },
                mpsc::error::TrySendError::Closed(_) => BridgeError::QueueClosed,
            })
    }

    /// Stop accepting, let the worker finish everything already accepted, and wait for it
    pub async fn shutdown(&self) {
        let Some(handle) = self.worker.lock().await.take() else {
            return;
        };
        self.closed.store(true, Ordering::Release);

        if self.sender.send(QueueCommand::Shutdown).await.is_err() {
            warn!("Update worker exited before shutdown was requested");
        }
        if let Err(e) = handle.await {
            error!("Update worker failed to join: {}", e);
        }
        info!("Update queue drained");
    }
}

async fn run_worker(processor: TaskUpdateProcessor, mut receiver: mpsc::Receiver<QueueCommand>) {
    while let Some(command) = receiver.recv().await {
        match command {
            QueueCommand::Process(update) => handle(&processor, &update).await,
            QueueCommand::Shutdown => {
                receiver.close();
                // Anything that raced in before the close still gets processed
                while let Ok(command) = receiver.try_recv() {
                    if let QueueCommand::Process(update) = command {
                        handle(&processor, &update).await;
                    }
                }
                break;
            }
        }
    }
    debug!("Update worker stopped");
}

async fn handle(processor: &TaskUpdateProcessor, update: &TaskUpdate) {
    let report = processor.process(update).await;
    if report.failed > 0 {
        warn!(
            "Task {} processed with {} of {} writes stored",
            update.id,
            report.succeeded(),
            report.attempted
        );
    } else {
        debug!("Task {} processed ({} writes)", update.id, report.attempted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryStore, MemoryGateway};
    use serde_json::json;
    use std::sync::Arc;

    fn update(id: &str) -> TaskUpdate {
        TaskUpdate::from_value(&json!({
            "id": id, "name": "Queue test", "status": "in_progress", "progress": 10
        }))
        .unwrap()
    }

    fn processor(store: &Arc<InMemoryStore>) -> TaskUpdateProcessor {
        TaskUpdateProcessor::new(MemoryGateway::new(store.clone()))
    }

    #[tokio::test]
    async fn test_shutdown_drains_in_order() {
        let store = Arc::new(InMemoryStore::new());
        let queue = UpdateQueue::spawn(processor(&store), 8);

        for id in ["T-1", "T-2", "T-3"] {
            tokio_test::assert_ok!(queue.submit(update(id)));
        }
        queue.shutdown().await;

        let order: Vec<String> = store
            .records()
            .iter()
            .filter_map(|r| r.metadata.task_id().map(str::to_string))
            .collect();
        assert_eq!(order, vec!["T-1", "T-2", "T-3"]);
    }

    #[tokio::test]
    async fn test_full_queue_refuses() {
        let store = Arc::new(InMemoryStore::new());
        let queue = UpdateQueue::spawn(processor(&store), 1);

        // Current-thread runtime: the worker cannot run until we yield
        assert!(queue.submit(update("T-1")).is_ok());
        assert_eq!(queue.pending(), 1);
        let err = queue.submit(update("T-2")).unwrap_err();
        assert!(matches!(err, BridgeError::QueueFull { capacity: 1 }));

        queue.shutdown().await;
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_closed() {
        let store = Arc::new(InMemoryStore::new());
        let queue = UpdateQueue::spawn(processor(&store), 4);
        queue.shutdown().await;
        queue.shutdown().await;

        let err = queue.submit(update("T-9")).unwrap_err();
        assert!(matches!(err, BridgeError::QueueClosed));
    }
}

//! Task Update Processor
//!
//! Turns one accepted task update into its store writes: the update itself,
//! a completion record for finished tasks, and one record per affected file.
//! Each write stands alone; a failed write never blocks the others.

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use super::task::TaskUpdate;
use crate::error::Result;
use crate::memory::{MemoryGateway, RecordMetadata};

/// Outcome of fanning out one update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessReport {
    pub attempted: usize,
    pub failed: usize,
}

impl ProcessReport {
    fn track(&mut self, outcome: Result<Value>, what: &str, task_id: &str) {
        self.attempted += 1;
        if let Err(e) = outcome {
            self.failed += 1;
            warn!("Failed to store {} for task {}: {}", what, task_id, e);
        }
    }

    pub fn succeeded(&self) -> usize {
        self.attempted - self.failed
    }
}

#[derive(Clone)]
pub struct TaskUpdateProcessor {
    gateway: MemoryGateway,
}

impl TaskUpdateProcessor {
    pub fn new(gateway: MemoryGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &MemoryGateway {
        &self.gateway
    }

    /// Store the summary record for one update
    pub async fn persist_update(&self, update: &TaskUpdate) -> Result<Value> {
        let now = Utc::now();
        let content = format!(
            "Task: {}\nStatus: {}\nProgress: {}%\nDescription: {}\nAssigned Agent: {}\nFiles: {}\nLast Updated: {}",
            update.name,
            update.status,
            update.progress,
            update.description,
            update.agent,
            update.affected_files.join(", "),
            now.to_rfc3339()
        );
        let metadata = RecordMetadata::TaskUpdate {
            task_id: update.id.clone(),
            project: self.gateway.user_scope().to_string(),
            agent: update.agent.clone(),
            status: update.status.to_string(),
            timestamp: now,
        };
        let ack = self.gateway.record(content, metadata).await?;
        info!("Task update stored: {}", update.name);
        Ok(ack)
    }

    async fn persist_completion(&self, update: &TaskUpdate) -> Result<Value> {
        let now = Utc::now();
        let duration = match update.metadata.get("duration") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "Unknown".to_string(),
            Some(other) => other.to_string(),
        };
        let content = format!(
            "Task Completed: {}\nTotal Progress Time: {}\nFiles Modified: {} ({})\nCompletion Time: {}\n\n\
             This task is now complete and can be referenced for future similar tasks.",
            update.name,
            duration,
            update.affected_files.len(),
            update.affected_files.join(", "),
            now.to_rfc3339()
        );
        self.gateway
            .record(
                content,
                RecordMetadata::TaskCompletion {
                    task_id: update.id.clone(),
                    timestamp: now,
                },
            )
            .await
    }

    async fn persist_file_activity(&self, update: &TaskUpdate, file_path: &str) -> Result<Value> {
        let now = Utc::now();
        let content = format!(
            "File Activity: {}\nRelated Task: {}\nTask Status: {}\nLast Modified: {}",
            file_path,
            update.name,
            update.status,
            now.to_rfc3339()
        );
        self.gateway
            .record(
                content,
                RecordMetadata::FileActivity {
                    file_path: file_path.to_string(),
                    task_id: update.id.clone(),
                    status: update.status.to_string(),
                    timestamp: now,
                },
            )
            .await
    }

    /// Fan one update out into 1 + (0 or 1) + |affected_files| writes
    pub async fn process(&self, update: &TaskUpdate) -> ProcessReport {
        let mut report = ProcessReport::default();

        report.track(self.persist_update(update).await, "task update", &update.id);

        if update.status.is_completed() {
            report.track(self.persist_completion(update).await, "completion record", &update.id);
        }

        for file_path in &update.affected_files {
            report.track(
                self.persist_file_activity(update, file_path).await,
                "file activity",
                &update.id,
            );
        }

        report
    }
}

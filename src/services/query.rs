//! Read-side operations for interactive consumers

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::Result;
use crate::memory::{ContextEntry, MemoryGateway, MemoryHit, RecordMetadata};

/// Upper bound on hits returned for one task's history
pub const TASK_HISTORY_LIMIT: usize = 100;

/// Source label stamped on records added through the tool surface
pub const EDITOR_SOURCE: &str = "mcp_editor";

#[derive(Clone)]
pub struct QueryFacade {
    gateway: MemoryGateway,
}

impl QueryFacade {
    pub fn new(gateway: MemoryGateway) -> Self {
        Self { gateway }
    }

    /// Recent project memories, reshaped for display
    pub async fn current_context(&self, limit: usize) -> Vec<ContextEntry> {
        let query = format!("{} project", self.gateway.user_scope());
        match self.gateway.search(&query, limit).await {
            Ok(hits) => hits.into_iter().map(ContextEntry::from).collect(),
            Err(e) => {
                warn!("Context lookup failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Memories mentioning a task id. Textual match only, so unrelated
    /// records can show up and ranking is whatever the store decides.
    pub async fn task_history(&self, task_id: &str) -> Vec<MemoryHit> {
        let query = format!("task_id: {task_id}");
        match self.gateway.search(&query, TASK_HISTORY_LIMIT).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Task history lookup for {} failed: {}", task_id, e);
                Vec::new()
            }
        }
    }

    pub async fn search(&self, query: &str, limit: usize) -> Vec<MemoryHit> {
        match self.gateway.search(query, limit).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Search for '{}' failed: {}", query, e);
                Vec::new()
            }
        }
    }

    /// Add a free-form memory on behalf of an editor
    pub async fn add(&self, content: &str, metadata: Map<String, Value>) -> Result<Value> {
        self.gateway
            .record(content, RecordMetadata::note(EDITOR_SOURCE, metadata))
            .await
    }

    /// Record what the developer says they are doing
    pub async fn log_activity(&self, activity: &str, files: &[String]) -> Result<Value> {
        let now = Utc::now();
        let listed = if files.is_empty() {
            "None specified".to_string()
        } else {
            files.join(", ")
        };
        let content = format!(
            "Development Activity:\n{}\nFiles: {}\nTime: {}\nSource: editor",
            activity,
            listed,
            now.to_rfc3339()
        );
        self.gateway
            .record(
                content,
                RecordMetadata::DevelopmentActivity {
                    source: EDITOR_SOURCE.to_string(),
                    project: None,
                    git_branch: None,
                    files: files.to_vec(),
                    timestamp: now,
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_store_failure_reads_as_empty() {
        let store = Arc::new(InMemoryStore::new());
        let facade = QueryFacade::new(MemoryGateway::new(store.clone()));
        facade.add("utlyze project kickoff", Map::new()).await.unwrap();
        assert_eq!(facade.current_context(10).await.len(), 1);

        // Searches never hit the failure rule, so use a broken gateway instead
        struct Down;
        #[async_trait::async_trait]
        impl crate::memory::MemoryStore for Down {
            async fn add(&self, _: crate::memory::MemoryRecord) -> Result<Value> {
                Err(crate::error::BridgeError::store("down"))
            }
            async fn search(&self, _: crate::memory::SearchQuery) -> Result<Vec<MemoryHit>> {
                Err(crate::error::BridgeError::store("down"))
            }
        }
        let down = QueryFacade::new(MemoryGateway::new(Arc::new(Down)));
        assert!(down.current_context(10).await.is_empty());
        assert!(down.task_history("T-1").await.is_empty());
        assert!(down.search("anything", 5).await.is_empty());
        assert!(down.add("x", Map::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_add_stamps_editor_source() {
        let store = Arc::new(InMemoryStore::new());
        let facade = QueryFacade::new(MemoryGateway::new(store.clone()));
        let extra = json!({"topic": "auth", "source": "spoofed"});

        facade
            .add("Decided on JWT", extra.as_object().unwrap().clone())
            .await
            .unwrap();

        let metadata = serde_json::to_value(&store.records()[0].metadata).unwrap();
        assert_eq!(metadata["source"], EDITOR_SOURCE);
        assert_eq!(metadata["topic"], "auth");
        assert!(metadata["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_log_activity_lists_files() {
        let store = Arc::new(InMemoryStore::new());
        let facade = QueryFacade::new(MemoryGateway::new(store.clone()));

        facade
            .log_activity("Refactoring auth", &["src/auth.rs".to_string()])
            .await
            .unwrap();

        let record = &store.records()[0];
        assert_eq!(record.metadata.kind(), "development_activity");
        assert!(record.content.contains("Files: src/auth.rs"));
    }
}

//! Memory Tools
//!
//! The five operations editors use to read and write project memory.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::{Tool, ToolOutput};
use crate::error::{BridgeError, Result};
use crate::services::QueryFacade;

const DEFAULT_LIMIT: usize = 10;

fn required_str<'a>(params: &'a Value, field: &str) -> Result<&'a str> {
    params[field]
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| BridgeError::validation(field, "missing required parameter"))
}

fn limit(params: &Value) -> usize {
    params["limit"]
        .as_u64()
        .map(|l| l as usize)
        .unwrap_or(DEFAULT_LIMIT)
}

pub struct GetContextTool {
    facade: QueryFacade,
}

impl GetContextTool {
    pub fn new(facade: QueryFacade) -> Self {
        Self { facade }
    }
}

#[async_trait]
impl Tool for GetContextTool {
    fn name(&self) -> String {
        "get_context".to_string()
    }

    fn description(&self) -> String {
        "Get current Utlyze project context from memory".to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "limit": {
                    "type": "integer",
                    "description": "Number of memories to retrieve",
                    "default": DEFAULT_LIMIT
                }
            }
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let context = self.facade.current_context(limit(&params)).await;
        if context.is_empty() {
            return Ok(ToolOutput::success("No memories found in current context."));
        }

        let mut formatted = String::from("Current Utlyze Context:\n\n");
        for (i, entry) in context.iter().enumerate() {
            formatted.push_str(&format!("{}. {}\n", i + 1, entry.content.trim()));
            if entry.metadata.as_object().is_some_and(|m| !m.is_empty()) {
                formatted.push_str(&format!(
                    "   Type: {}\n   Time: {}\n",
                    entry.metadata["type"].as_str().unwrap_or("unknown"),
                    entry.metadata["timestamp"].as_str().unwrap_or("unknown")
                ));
            }
            formatted.push('\n');
        }
        Ok(ToolOutput::success(formatted))
    }
}

pub struct SearchMemoryTool {
    facade: QueryFacade,
}

impl SearchMemoryTool {
    pub fn new(facade: QueryFacade) -> Self {
        Self { facade }
    }
}

#[async_trait]
impl Tool for SearchMemoryTool {
    fn name(&self) -> String {
        "search_memory".to_string()
    }

    fn description(&self) -> String {
        "Search Utlyze memories for specific content".to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query" },
                "limit": { "type": "integer", "description": "Max results", "default": DEFAULT_LIMIT }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let query = required_str(&params, "query")?;
        let hits = self.facade.search(query, limit(&params)).await;
        if hits.is_empty() {
            return Ok(ToolOutput::success(format!("No memories found matching: {query}")));
        }

        let mut formatted = format!("Search Results for '{query}':\n\n");
        for (i, hit) in hits.iter().enumerate() {
            formatted.push_str(&format!(
                "{}. {}\n   Score: {:.2}\n\n",
                i + 1,
                hit.content.trim(),
                hit.score.unwrap_or(0.0)
            ));
        }
        Ok(ToolOutput::success(formatted))
    }
}

pub struct AddMemoryTool {
    facade: QueryFacade,
}

impl AddMemoryTool {
    pub fn new(facade: QueryFacade) -> Self {
        Self { facade }
    }
}

#[async_trait]
impl Tool for AddMemoryTool {
    fn name(&self) -> String {
        "add_memory".to_string()
    }

    fn description(&self) -> String {
        "Add a new memory to Utlyze project".to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "content": { "type": "string", "description": "Memory content to add" },
                "metadata": { "type": "object", "description": "Additional metadata", "default": {} }
            },
            "required": ["content"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let content = required_str(&params, "content")?;
        let metadata = match &params["metadata"] {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            _ => return Err(BridgeError::validation("metadata", "must be an object")),
        };
        let result = self.facade.add(content, metadata).await?;
        Ok(ToolOutput::success(format!("Memory added successfully: {result}")))
    }
}

pub struct GetTaskHistoryTool {
    facade: QueryFacade,
}

impl GetTaskHistoryTool {
    pub fn new(facade: QueryFacade) -> Self {
        Self { facade }
    }
}

#[async_trait]
impl Tool for GetTaskHistoryTool {
    fn name(&self) -> String {
        "get_task_history".to_string()
    }

    fn description(&self) -> String {
        "Get history for a specific task".to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "task_id": { "type": "string", "description": "Task ID to get history for" }
            },
            "required": ["task_id"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let task_id = required_str(&params, "task_id")?;
        let memories = self.facade.task_history(task_id).await;
        if memories.is_empty() {
            return Ok(ToolOutput::success(format!("No history found for task: {task_id}")));
        }

        let mut formatted = format!("Task History for {task_id}:\n\n");
        for memory in &memories {
            formatted.push_str(&format!("- {}\n", memory.content.trim()));
            if let Some(created_at) = &memory.created_at {
                formatted.push_str(&format!("  Time: {created_at}\n"));
            }
            formatted.push('\n');
        }
        Ok(ToolOutput::success(formatted))
    }
}

pub struct LogActivityTool {
    facade: QueryFacade,
}

impl LogActivityTool {
    pub fn new(facade: QueryFacade) -> Self {
        Self { facade }
    }
}

#[async_trait]
impl Tool for LogActivityTool {
    fn name(&self) -> String {
        "log_activity".to_string()
    }

    fn description(&self) -> String {
        "Log current development activity".to_string()
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "activity": { "type": "string", "description": "Description of current activity" },
                "files": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Files being worked on",
                    "default": []
                }
            },
            "required": ["activity"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let activity = required_str(&params, "activity")?;
        let files: Vec<String> = match &params["files"] {
            Value::Null => Vec::new(),
            value => serde_json::from_value(value.clone())
                .map_err(|_| BridgeError::validation("files", "must be a list of strings"))?,
        };
        self.facade.log_activity(activity, &files).await?;
        Ok(ToolOutput::success(format!("Activity logged: {activity}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryStore, MemoryGateway};
    use std::sync::Arc;

    fn facade() -> (Arc<InMemoryStore>, QueryFacade) {
        let store = Arc::new(InMemoryStore::new());
        let facade = QueryFacade::new(MemoryGateway::new(store.clone()));
        (store, facade)
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let (_, facade) = facade();
        let err = SearchMemoryTool::new(facade).execute(json!({})).await.unwrap_err();
        assert!(matches!(err, BridgeError::Validation { ref field, .. } if field == "query"));
    }

    #[tokio::test]
    async fn test_empty_results_have_friendly_text() {
        let (_, facade) = facade();
        let out = GetContextTool::new(facade.clone()).execute(json!({})).await.unwrap();
        assert_eq!(out.summary, "No memories found in current context.");

        let out = GetTaskHistoryTool::new(facade)
            .execute(json!({"task_id": "T-404"}))
            .await
            .unwrap();
        assert_eq!(out.summary, "No history found for task: T-404");
    }

    #[tokio::test]
    async fn test_log_activity_rejects_bad_files() {
        let (store, facade) = facade();
        let err = LogActivityTool::new(facade)
            .execute(json!({"activity": "x", "files": "not-a-list"}))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::Validation { .. }));
        assert_eq!(store.write_count(), 0);
    }
}

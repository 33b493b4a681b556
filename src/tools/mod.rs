//! Tool System Module
//!
//! The editor-facing tool surface: named operations with JSON-schema
//! parameters that return human-readable text.

mod mcp;
mod memory;

pub use mcp::McpServer;
pub use memory::{AddMemoryTool, GetContextTool, GetTaskHistoryTool, LogActivityTool, SearchMemoryTool};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::error::Result;
use crate::services::QueryFacade;

/// Output from a tool execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolOutput {
    pub success: bool,
    /// Text shown to the caller
    pub summary: String,
}

impl ToolOutput {
    pub fn success(summary: impl Into<String>) -> Self {
        Self {
            success: true,
            summary: summary.into(),
        }
    }

    pub fn failure(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            summary: format!("Error: {}", error),
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> String;

    fn description(&self) -> String;

    /// JSON schema for the tool's arguments
    fn parameters(&self) -> Value;

    async fn execute(&self, params: Value) -> Result<ToolOutput>;
}

/// Registry of available tools, listed in name order
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<BTreeMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the five memory tools wired to `facade`
    pub async fn with_memory_tools(facade: QueryFacade) -> Self {
        let registry = Self::new();
        registry.register_instance(GetContextTool::new(facade.clone())).await;
        registry.register_instance(SearchMemoryTool::new(facade.clone())).await;
        registry.register_instance(AddMemoryTool::new(facade.clone())).await;
        registry.register_instance(GetTaskHistoryTool::new(facade.clone())).await;
        registry.register_instance(LogActivityTool::new(facade)).await;
        registry
    }

    pub async fn register_instance<T: Tool + 'static>(&self, tool: T) {
        let mut tools = self.tools.write().await;
        tools.insert(tool.name(), Arc::new(tool));
    }

    pub async fn tool_names(&self) -> Vec<String> {
        self.tools.read().await.keys().cloned().collect()
    }

    /// Tool listing in the shape editors expect
    pub async fn definitions(&self) -> Vec<Value> {
        self.tools
            .read()
            .await
            .values()
            .map(|tool| {
                json!({
                    "name": tool.name(),
                    "description": tool.description(),
                    "inputSchema": tool.parameters(),
                })
            })
            .collect()
    }

    /// Run a tool by name. Tool errors come back as failed outputs.
    pub async fn execute(&self, name: &str, params: Value) -> ToolOutput {
        let tool = self.tools.read().await.get(name).cloned();
        let Some(tool) = tool else {
            return ToolOutput::failure(format!("Unknown tool: {name}"));
        };

        debug!("Executing tool {}", name);
        match tool.execute(params).await {
            Ok(output) => output,
            Err(e) => {
                error!("Error in tool {}: {}", name, e);
                ToolOutput::failure(e)
            }
        }
    }
}

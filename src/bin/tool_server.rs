//! Editor tool server over stdio

use anyhow::{Context, Result};
use std::sync::Arc;

use recall_bridge::services::QueryFacade;
use recall_bridge::tools::{McpServer, ToolRegistry};
use recall_bridge::utils::{init_tracing, LogTarget};
use recall_bridge::{BridgeConfig, MemoryGateway};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("recall_bridge=info", LogTarget::Stderr);

    let config = BridgeConfig::from_env().context("failed to load configuration")?;
    let facade = QueryFacade::new(MemoryGateway::connect(&config)?);
    let registry = Arc::new(ToolRegistry::with_memory_tools(facade).await);

    McpServer::new(registry).serve_stdio().await
}

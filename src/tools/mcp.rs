//! Model Context Protocol (MCP) Server
//!
//! Serves the tool registry to editors over newline-delimited JSON-RPC 2.0
//! on stdio. Tool failures are returned as `isError` content blocks, not as
//! protocol errors.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use super::ToolRegistry;

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "utlyze-memory";

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

/// JSON-RPC 2.0 Request
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: Option<String>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
    /// Absent for notifications
    #[serde(default)]
    id: Option<Value>,
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
    id: Value,
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

impl JsonRpcResponse {
    fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            result: Some(result),
            error: None,
            id,
        }
    }

    fn err(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
            id,
        }
    }
}

pub struct McpServer {
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Handle one line of input. Returns `None` for notifications.
    pub async fn handle_message(&self, line: &str) -> Option<Value> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                warn!("Unparseable MCP message: {}", e);
                let response = JsonRpcResponse::err(Value::Null, PARSE_ERROR, format!("Parse error: {e}"));
                return serde_json::to_value(response).ok();
            }
        };

        let Some(id) = request.id else {
            debug!("MCP notification: {}", request.method);
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::ok(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": {} },
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }),
            ),
            "ping" => JsonRpcResponse::ok(id, json!({})),
            "tools/list" => JsonRpcResponse::ok(id, json!({ "tools": self.registry.definitions().await })),
            "tools/call" => self.call_tool(id, request.params.unwrap_or(Value::Null)).await,
            other => JsonRpcResponse::err(id, METHOD_NOT_FOUND, format!("Method not found: {other}")),
        };
        serde_json::to_value(response).ok()
    }

    async fn call_tool(&self, id: Value, params: Value) -> JsonRpcResponse {
        let Some(name) = params["name"].as_str() else {
            return JsonRpcResponse::err(id, INVALID_PARAMS, "tools/call requires a tool name");
        };
        let arguments = match &params["arguments"] {
            Value::Null => json!({}),
            args => args.clone(),
        };

        let output = self.registry.execute(name, arguments).await;
        JsonRpcResponse::ok(
            id,
            json!({
                "content": [{ "type": "text", "text": output.summary }],
                "isError": !output.success,
            }),
        )
    }

    /// Serve requests from `reader` until it closes
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await.context("failed to read MCP input")? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_message(&line).await {
                let mut out = serde_json::to_string(&response)?;
                out.push('\n');
                writer.write_all(out.as_bytes()).await?;
                writer.flush().await?;
            }
        }
        info!("MCP input closed");
        Ok(())
    }

    pub async fn serve_stdio(&self) -> anyhow::Result<()> {
        info!("MCP server ready on stdio");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryStore, MemoryGateway};
    use crate::services::QueryFacade;

    async fn server() -> (Arc<InMemoryStore>, McpServer) {
        let store = Arc::new(InMemoryStore::new());
        let facade = QueryFacade::new(MemoryGateway::new(store.clone()));
        let registry = Arc::new(ToolRegistry::with_memory_tools(facade).await);
        (store, McpServer::new(registry))
    }

    #[tokio::test]
    async fn test_lists_five_tools() {
        let (_, server) = server().await;
        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
            .await
            .unwrap();
        let names: Vec<&str> = response["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["add_memory", "get_context", "get_task_history", "log_activity", "search_memory"]
        );
    }

    #[tokio::test]
    async fn test_notifications_and_bad_input() {
        let (_, server) = server().await;
        assert!(server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .is_none());

        let response = server.handle_message("{not json").await.unwrap();
        assert_eq!(response["error"]["code"], PARSE_ERROR);

        let response = server
            .handle_message(r#"{"jsonrpc":"2.0","id":"a","method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(response["id"], "a");
    }

    #[tokio::test]
    async fn test_tool_error_is_content_not_protocol_error() {
        let (store, server) = server().await;
        let response = server
            .handle_message(
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"add_memory","arguments":{}}}"#,
            )
            .await
            .unwrap();
        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], true);
        assert!(response["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("Error:"));
        assert_eq!(store.write_count(), 0);
    }
}

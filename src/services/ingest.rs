//! Task Ingest Service
//!
//! HTTP surface for the tracking tool. Single updates are validated and
//! handed to the update queue before the response goes out; full syncs are
//! processed inline and answered with per-task results.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use super::processor::TaskUpdateProcessor;
use super::query::QueryFacade;
use super::queue::UpdateQueue;
use super::task::TaskUpdate;
use crate::error::{BridgeError, Result};
use crate::memory::RecordMetadata;

pub const SERVICE_NAME: &str = "Utlyze Taskmaster-Mem0 Bridge";
const DEFAULT_CONTEXT_LIMIT: usize = 10;

pub struct AppState {
    pub queue: Arc<UpdateQueue>,
    pub processor: TaskUpdateProcessor,
    pub query: QueryFacade,
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub tasks: Vec<Value>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Outcome of a full task-list sync
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncResult {
    pub synced_tasks: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ContextParams {
    limit: Option<usize>,
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/webhook/task-update", post(task_update_handler))
        .route("/webhook/sync", post(sync_handler))
        .route("/context", get(context_handler))
        .route("/task/{task_id}/history", get(task_history_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Taskmaster bridge listening at http://{}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Persist every task in order, collecting failures, then write one summary
pub async fn sync_tasks(processor: &TaskUpdateProcessor, tasks: &[Value]) -> SyncResult {
    let mut result = SyncResult::default();

    for raw in tasks {
        let outcome = match TaskUpdate::from_value(raw) {
            Ok(update) => processor.persist_update(&update).await.map(|_| ()),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(()) => result.synced_tasks += 1,
            Err(e) => result
                .errors
                .push(format!("Error syncing task {}: {}", TaskUpdate::id_hint(raw), e)),
        }
    }

    let total = tasks.len();
    let active = tasks
        .iter()
        .filter(|t| t.get("status").and_then(Value::as_str) != Some("completed"))
        .count();
    let now = Utc::now();
    let summary = format!(
        "Taskmaster Sync Complete:\nTotal Tasks: {}\nActive Tasks: {}\nSync Time: {}",
        total,
        active,
        now.to_rfc3339()
    );
    let metadata = RecordMetadata::SyncSummary {
        total_tasks: total,
        active_tasks: active,
        timestamp: now,
    };
    if let Err(e) = processor.gateway().record(summary, metadata).await {
        warn!("Failed to store sync summary: {}", e);
    }

    result
}

async fn health_handler() -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "status": "running",
        "timestamp": now(),
    }))
}

async fn task_update_handler(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(payload) = payload.map_err(|e| BridgeError::validation("body", e.body_text()))?;
    let update = TaskUpdate::from_value(&payload)?;
    info!("Received task update: {} ({})", update.name, update.status);

    let task_id = update.id.clone();
    state.queue.submit(update)?;

    Ok(Json(json!({
        "status": "accepted",
        "task_id": task_id,
        "timestamp": now(),
    })))
}

async fn sync_handler(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SyncRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(request) = payload.map_err(|e| BridgeError::validation("body", e.body_text()))?;
    info!("Received full sync with {} tasks", request.tasks.len());

    let result = sync_tasks(&state.processor, &request.tasks).await;

    Ok(Json(json!({
        "status": "synced",
        "synced_tasks": result.synced_tasks,
        "errors": result.errors,
        "timestamp": now(),
    })))
}

async fn context_handler(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<ContextParams>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(params) = params.map_err(|e| BridgeError::validation("limit", e.body_text()))?;
    let context = state
        .query
        .current_context(params.limit.unwrap_or(DEFAULT_CONTEXT_LIMIT))
        .await;

    Ok(Json(json!({
        "count": context.len(),
        "context": context,
        "timestamp": now(),
    })))
}

async fn task_history_handler(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Json<Value> {
    let memories = state.query.task_history(&task_id).await;
    Json(json!({
        "task_id": task_id,
        "count": memories.len(),
        "memories": memories,
        "timestamp": now(),
    }))
}

//! Recall Bridge server
//!
//! Runs the task-ingestion webhooks and the activity monitor side by side
//! until Ctrl-C, then drains accepted updates before exiting.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use recall_bridge::context::ContextSampler;
use recall_bridge::services::{ingest, ActivitySyncLoop, AppState, QueryFacade, TaskUpdateProcessor, UpdateQueue};
use recall_bridge::utils::{init_tracing, LogTarget};
use recall_bridge::{BridgeConfig, MemoryGateway};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("recall_bridge=info,tower_http=info", LogTarget::Stdout);

    let config = BridgeConfig::from_env().context("failed to load configuration")?;
    let gateway = MemoryGateway::connect(&config)?;

    let processor = TaskUpdateProcessor::new(gateway.clone());
    let queue = Arc::new(UpdateQueue::spawn(processor.clone(), config.queue_capacity));
    let state = Arc::new(AppState {
        queue: queue.clone(),
        processor,
        query: QueryFacade::new(gateway.clone()),
    });

    let activity = ActivitySyncLoop::new(
        ContextSampler::new(&config.watch_root),
        gateway,
        config.activity_interval,
    );
    activity.start().await;

    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Starting Taskmaster-Mem0 Bridge on port {}", config.port);

    let served = ingest::serve(listener, state, shutdown_signal()).await;

    activity.stop().await;
    queue.shutdown().await;
    served
}

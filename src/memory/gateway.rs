//! Memory Gateway
//!
//! The only path from the bridge to the remote store. Applies the fixed user
//! scope and turns raw content plus typed metadata into validated records.
//! No retries happen here; callers decide whether a dropped write matters.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{Mem0Store, MemoryHit, MemoryRecord, MemoryStore, RecordMetadata, SearchQuery};
use crate::config::BridgeConfig;
use crate::error::Result;

/// Identity under which every record is stored and searched
pub const USER_SCOPE: &str = "utlyze";

#[derive(Clone)]
pub struct MemoryGateway {
    store: Arc<dyn MemoryStore>,
    user_scope: String,
}

impl MemoryGateway {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self {
            store,
            user_scope: USER_SCOPE.to_string(),
        }
    }

    /// Gateway backed by the Mem0 platform
    pub fn connect(config: &BridgeConfig) -> Result<Self> {
        let store = Mem0Store::new(&config.base_url, &config.api_key, config.store_timeout)?;
        info!("Mem0 client initialized for {}", USER_SCOPE);
        Ok(Self::new(Arc::new(store)))
    }

    pub fn user_scope(&self) -> &str {
        &self.user_scope
    }

    /// Write one record to the store
    pub async fn record(&self, content: impl Into<String>, metadata: RecordMetadata) -> Result<Value> {
        let record = MemoryRecord::new(content, metadata, self.user_scope.clone())?;
        let kind = record.metadata.kind();
        match self.store.add(record).await {
            Ok(ack) => {
                debug!("Stored {} record", kind);
                Ok(ack)
            }
            Err(e) => {
                warn!("Failed to store {} record: {}", kind, e);
                Err(e)
            }
        }
    }

    /// Search the store within the bridge's scope
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<MemoryHit>> {
        self.store
            .search(SearchQuery {
                query: query.to_string(),
                user_scope: self.user_scope.clone(),
                limit,
            })
            .await
    }

    /// Log a shell-level activity (directory, branch, last command)
    pub async fn record_terminal_activity(
        &self,
        cwd: &str,
        git_branch: Option<&str>,
        last_command: Option<&str>,
    ) -> Result<Value> {
        let now = Utc::now();
        let content = format!(
            "Terminal Activity:\nDirectory: {}\nBranch: {}\nCommand: {}\nTime: {}",
            cwd,
            git_branch.unwrap_or("No git"),
            last_command.unwrap_or(""),
            now.to_rfc3339()
        );
        self.record(
            content,
            RecordMetadata::TerminalActivity {
                cwd: cwd.to_string(),
                timestamp: now,
            },
        )
        .await
    }
}

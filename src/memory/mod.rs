//! Memory System Module
//!
//! Adapters for the remote long-term memory store plus the gateway that
//! scopes every call to the bridge's user identity.

pub mod gateway;
pub mod local;
pub mod mem0;
pub mod record;

pub use gateway::{MemoryGateway, USER_SCOPE};
pub use local::InMemoryStore;
pub use mem0::Mem0Store;
pub use record::{ContextEntry, MemoryHit, MemoryRecord, RecordMetadata};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// A scoped search against the store
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub user_scope: String,
    pub limit: usize,
}

/// Trait for remote memory stores that accept records and answer searches
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Persist a record; the store's acknowledgment is returned untouched
    async fn add(&self, record: MemoryRecord) -> Result<Value>;

    /// Search for records relevant to the query, best match first
    async fn search(&self, query: SearchQuery) -> Result<Vec<MemoryHit>>;
}

//! In-process memory store
//!
//! Keeps every accepted record in a vector and answers searches by simple
//! term matching. Used for dry runs and as the store behind the test suites;
//! a failure rule lets callers make selected writes fail.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::{MemoryHit, MemoryRecord, MemoryStore, SearchQuery};
use crate::error::{BridgeError, Result};

type FailureRule = Arc<dyn Fn(&MemoryRecord) -> bool + Send + Sync>;

#[derive(Debug, Clone)]
struct StoredRecord {
    id: String,
    record: MemoryRecord,
    created_at: String,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    records: Arc<Mutex<Vec<StoredRecord>>>,
    failure_rule: Option<FailureRule>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every write for which `rule` returns true
    pub fn fail_when<F>(mut self, rule: F) -> Self
    where
        F: Fn(&MemoryRecord) -> bool + Send + Sync + 'static,
    {
        self.failure_rule = Some(Arc::new(rule));
        self
    }

    /// Snapshot of the accepted records, oldest first
    pub fn records(&self) -> Vec<MemoryRecord> {
        self.lock().iter().map(|stored| stored.record.clone()).collect()
    }

    pub fn write_count(&self) -> usize {
        self.lock().len()
    }

    /// Number of accepted records whose metadata carries the given `type` tag
    pub fn count_kind(&self, kind: &str) -> usize {
        self.lock()
            .iter()
            .filter(|stored| stored.record.metadata.kind() == kind)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<StoredRecord>> {
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn add(&self, record: MemoryRecord) -> Result<Value> {
        if let Some(rule) = &self.failure_rule {
            if rule(&record) {
                return Err(BridgeError::StoreUnavailable(format!(
                    "write rejected for {} record",
                    record.metadata.kind()
                )));
            }
        }

        let id = Uuid::new_v4().to_string();
        self.lock().push(StoredRecord {
            id: id.clone(),
            record,
            created_at: chrono::Utc::now().to_rfc3339(),
        });
        Ok(json!([{ "id": id, "event": "ADD" }]))
    }

    async fn search(&self, query: SearchQuery) -> Result<Vec<MemoryHit>> {
        let terms: Vec<String> = query
            .query
            .split(|c: char| c.is_whitespace() || c == ':')
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
            .collect();

        let records = self.lock();
        let mut scored: Vec<(usize, &StoredRecord)> = records
            .iter()
            .filter(|stored| stored.record.user_scope == query.user_scope)
            .filter_map(|stored| {
                let haystack = format!(
                    "{} {}",
                    stored.record.content,
                    serde_json::to_string(&stored.record.metadata).unwrap_or_default()
                )
                .to_lowercase();
                let hits = terms.iter().filter(|term| haystack.contains(term.as_str())).count();
                (hits > 0).then_some((hits, stored))
            })
            .collect();

        // Best match first, newest first among equals
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.created_at.cmp(&a.1.created_at)));

        Ok(scored
            .into_iter()
            .take(query.limit)
            .map(|(hits, stored)| MemoryHit {
                id: Some(stored.id.clone()),
                content: stored.record.content.clone(),
                metadata: serde_json::to_value(&stored.record.metadata).ok(),
                created_at: Some(stored.created_at.clone()),
                score: Some(hits as f64 / terms.len().max(1) as f64),
            })
            .collect())
    }
}

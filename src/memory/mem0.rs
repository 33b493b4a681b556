//! Mem0 platform client
//!
//! Talks to the hosted Mem0 REST API. Records are sent as a single user
//! message; search results come back either as a bare array or wrapped in
//! `{"results": [...]}` depending on the API version.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::{MemoryHit, MemoryRecord, MemoryStore, SearchQuery};
use crate::error::{BridgeError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.mem0.ai";

#[derive(Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Bare(Vec<MemoryHit>),
    Wrapped { results: Vec<MemoryHit> },
}

pub struct Mem0Store {
    client: Client,
    base_url: String,
    api_key: String,
}

impl Mem0Store {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Token {}", self.api_key))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let resp = request.send().await.map_err(BridgeError::store)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BridgeError::StoreUnavailable(format!("HTTP {status}: {body}")));
        }
        resp.json().await.map_err(BridgeError::store)
    }
}

#[async_trait]
impl MemoryStore for Mem0Store {
    async fn add(&self, record: MemoryRecord) -> Result<Value> {
        debug!("Mem0 add ({})", record.metadata.kind());
        let body = json!({
            "messages": [{ "role": "user", "content": record.content }],
            "user_id": record.user_scope,
            "metadata": record.metadata,
        });
        self.send(self.post("/v1/memories/").json(&body)).await
    }

    async fn search(&self, query: SearchQuery) -> Result<Vec<MemoryHit>> {
        debug!("Mem0 search '{}' (limit {})", query.query, query.limit);
        let body = json!({
            "query": query.query,
            "user_id": query.user_scope,
            "limit": query.limit,
        });
        let data = self.send(self.post("/v1/memories/search/").json(&body)).await?;
        let parsed: SearchResponse = serde_json::from_value(data)
            .map_err(|e| BridgeError::StoreUnavailable(format!("unexpected search response: {e}")))?;
        Ok(match parsed {
            SearchResponse::Bare(hits) | SearchResponse::Wrapped { results: hits } => hits,
        })
    }
}

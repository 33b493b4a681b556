//! Memory Record types
//!
//! Every write to the remote store is a `MemoryRecord`: free text plus a
//! metadata payload whose shape is fixed per record `type`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BridgeError, Result};

/// Metadata keys owned by the bridge; caller-supplied notes may not override them.
const RESERVED_NOTE_KEYS: [&str; 3] = ["type", "source", "timestamp"];

/// Structured metadata attached to a memory record, tagged by record type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordMetadata {
    /// Sampled or self-reported developer activity
    DevelopmentActivity {
        source: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        project: Option<String>,
        git_branch: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        files: Vec<String>,
        timestamp: DateTime<Utc>,
    },
    TaskUpdate {
        task_id: String,
        project: String,
        agent: String,
        status: String,
        timestamp: DateTime<Utc>,
    },
    TaskCompletion {
        task_id: String,
        timestamp: DateTime<Utc>,
    },
    FileActivity {
        file_path: String,
        task_id: String,
        status: String,
        timestamp: DateTime<Utc>,
    },
    SyncSummary {
        total_tasks: usize,
        active_tasks: usize,
        timestamp: DateTime<Utc>,
    },
    TerminalActivity {
        cwd: String,
        timestamp: DateTime<Utc>,
    },
    /// Free-form memory added through the tool surface
    Note {
        source: String,
        timestamp: DateTime<Utc>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl RecordMetadata {
    /// Build a free-form note, dropping any caller keys that would clash with the tag.
    pub fn note(source: impl Into<String>, extra: Map<String, Value>) -> Self {
        let extra = extra
            .into_iter()
            .filter(|(key, _)| !RESERVED_NOTE_KEYS.contains(&key.as_str()))
            .collect();
        Self::Note {
            source: source.into(),
            timestamp: Utc::now(),
            extra,
        }
    }

    /// The `type` tag this metadata serializes with
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DevelopmentActivity { .. } => "development_activity",
            Self::TaskUpdate { .. } => "task_update",
            Self::TaskCompletion { .. } => "task_completion",
            Self::FileActivity { .. } => "file_activity",
            Self::SyncSummary { .. } => "sync_summary",
            Self::TerminalActivity { .. } => "terminal_activity",
            Self::Note { .. } => "note",
        }
    }

    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::TaskUpdate { task_id, .. }
            | Self::TaskCompletion { task_id, .. }
            | Self::FileActivity { task_id, .. } => Some(task_id),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::DevelopmentActivity { source, .. } | Self::Note { source, .. } => {
                require_non_empty("source", source)
            }
            Self::TaskUpdate { task_id, status, .. } => {
                require_non_empty("task_id", task_id)?;
                require_non_empty("status", status)
            }
            Self::TaskCompletion { task_id, .. } => require_non_empty("task_id", task_id),
            Self::FileActivity {
                file_path, task_id, ..
            } => {
                require_non_empty("file_path", file_path)?;
                require_non_empty("task_id", task_id)
            }
            Self::SyncSummary {
                total_tasks,
                active_tasks,
                ..
            } => {
                if active_tasks > total_tasks {
                    return Err(BridgeError::validation(
                        "active_tasks",
                        format!("{active_tasks} active exceeds {total_tasks} total"),
                    ));
                }
                Ok(())
            }
            Self::TerminalActivity { cwd, .. } => require_non_empty("cwd", cwd),
        }
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BridgeError::validation(field, "must not be empty"));
    }
    Ok(())
}

/// A single write destined for the remote store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryRecord {
    pub content: String,
    pub metadata: RecordMetadata,
    pub user_scope: String,
}

impl MemoryRecord {
    /// Create a record, rejecting empty content and malformed metadata
    pub fn new(
        content: impl Into<String>,
        metadata: RecordMetadata,
        user_scope: impl Into<String>,
    ) -> Result<Self> {
        let content = content.into();
        require_non_empty("content", &content)?;
        metadata.validate()?;
        Ok(Self {
            content,
            metadata,
            user_scope: user_scope.into(),
        })
    }
}

/// A search hit as returned by the remote store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryHit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "memory", alias = "content", default)]
    pub content: String,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// A hit reshaped for context consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub content: String,
    pub metadata: Value,
    pub created_at: String,
}

impl From<MemoryHit> for ContextEntry {
    fn from(hit: MemoryHit) -> Self {
        Self {
            content: hit.content,
            metadata: hit.metadata.unwrap_or_else(|| Value::Object(Map::new())),
            created_at: hit.created_at.unwrap_or_default(),
        }
    }
}

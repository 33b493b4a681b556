//! Task-update payloads sent by the tracking tool

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{BridgeError, Result};

const OPTIONAL_FIELDS: [&str; 4] = ["description", "agent", "affected_files", "metadata"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    /// Any status the tracking tool invents
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Other(s) => s,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => Self::Pending,
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            _ => Self::Other(s),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_agent() -> String {
    "unassigned".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub id: String,
    pub name: String,
    pub status: TaskStatus,
    /// Percent complete, 0 to 100
    pub progress: u8,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_agent")]
    pub agent: String,
    #[serde(default, alias = "affectedFiles")]
    pub affected_files: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl TaskUpdate {
    /// Validate a raw payload, naming the first offending field on failure
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| BridgeError::validation("body", "expected a JSON object"))?;

        for field in ["id", "name", "status"] {
            match object.get(field) {
                None | Some(Value::Null) => {
                    return Err(BridgeError::validation(field, "field required"))
                }
                Some(Value::String(s)) if field != "name" && s.trim().is_empty() => {
                    return Err(BridgeError::validation(field, "must not be empty"))
                }
                Some(Value::String(_)) => {}
                Some(_) => return Err(BridgeError::validation(field, "must be a string")),
            }
        }

        match object.get("progress") {
            None | Some(Value::Null) => {
                return Err(BridgeError::validation("progress", "field required"))
            }
            Some(progress) => match progress.as_i64() {
                Some(p) if (0..=100).contains(&p) => {}
                Some(p) => {
                    return Err(BridgeError::validation(
                        "progress",
                        format!("must be between 0 and 100, got {p}"),
                    ))
                }
                None => return Err(BridgeError::validation("progress", "must be an integer")),
            },
        }

        // Explicit nulls on optional fields mean "use the default"
        let mut cleaned = object.clone();
        cleaned.retain(|key, v| !(v.is_null() && OPTIONAL_FIELDS.contains(&key.as_str())));
        if let Some(files) = cleaned.remove("affectedFiles") {
            if !files.is_null() {
                cleaned.entry("affected_files").or_insert(files);
            }
        }

        let update: Self = serde_json::from_value(Value::Object(cleaned))
            .map_err(|e| BridgeError::validation("body", e.to_string()))?;
        if let Some(i) = update.affected_files.iter().position(|f| f.trim().is_empty()) {
            return Err(BridgeError::validation(
                "affected_files",
                format!("entry {i} must not be empty"),
            ));
        }
        Ok(update)
    }

    /// Best label for error messages when a raw payload may lack an id
    pub fn id_hint(value: &Value) -> String {
        match value.get("id") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => "unknown".to_string(),
        }
    }
}

//! Execution records as reported by the backend

use serde::{Deserialize, Serialize};

/// Lifecycle status of an execution. Owned by the backend; read-only here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

/// One entry of the execution timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub id: String,
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub status: ExecutionStatus,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

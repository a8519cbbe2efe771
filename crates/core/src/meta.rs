//! Aggregated dashboard payload served by `/meta`

use serde::{Deserialize, Serialize};

use crate::execution::Execution;
use crate::tool::ToolSpec;

/// Per-slice failure diagnostics; `None` means the slice loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MetaErrors {
    pub tools: Option<String>,
    pub executions: Option<String>,
}

impl MetaErrors {
    pub fn any(&self) -> bool {
        self.tools.is_some() || self.executions.is_some()
    }

    /// First diagnostic available, tools first
    pub fn first(&self) -> Option<&str> {
        self.tools.as_deref().or(self.executions.as_deref())
    }
}

/// Tool panel and execution panel data in one payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DashboardMeta {
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub tool_details: Vec<ToolSpec>,
    #[serde(default)]
    pub executions: Vec<Execution>,
    #[serde(default)]
    pub errors: MetaErrors,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

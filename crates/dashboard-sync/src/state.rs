//! Dashboard state owned by the synchronizer

use console_core::{
    DashboardMeta, Entity, Execution, ExecutionStatus, RunResult, Summary, ToolSpec,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendStatus {
    #[default]
    Ok,
    Offline,
}

/// Whether the dashboard is currently on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// Which triggers the UI may offer right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub run_enabled: bool,
    pub summarize_enabled: bool,
    pub search_enabled: bool,
    pub refreshing: bool,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            run_enabled: true,
            summarize_enabled: true,
            search_enabled: true,
            refreshing: false,
        }
    }
}

/// Everything the dashboard renders.
///
/// Each cache is replaced wholesale by the operation that owns it; nothing is
/// merged across refreshes.
#[derive(Debug, Clone, Serialize, Default)]
pub struct DashboardState {
    pub backend_status: BackendStatus,
    pub tools: Vec<String>,
    pub tool_details: Vec<ToolSpec>,
    pub selected_tool: Option<ToolSpec>,
    pub executions: Vec<Execution>,
    /// Local wall-clock time of the last completed refresh
    pub last_updated: Option<String>,
    pub last_result: Option<RunResult>,
    pub run_error: Option<String>,
    pub summaries: Vec<Summary>,
    pub entities: Vec<Entity>,
    pub memory_error: Option<String>,
    pub auto_refresh: bool,
    pub visibility: Visibility,
    pub controls: Controls,
}

impl DashboardState {
    pub(crate) fn new(auto_refresh: bool) -> Self {
        Self {
            auto_refresh,
            ..Self::default()
        }
    }

    pub fn active_count(&self) -> usize {
        self.count_with(ExecutionStatus::Running)
    }

    pub fn completed_count(&self) -> usize {
        self.count_with(ExecutionStatus::Completed)
    }

    fn count_with(&self, status: ExecutionStatus) -> usize {
        self.executions
            .iter()
            .filter(|execution| execution.status == status)
            .count()
    }

    /// Marks the backend offline and shows why in place of the tool list
    fn mark_offline(&mut self, reason: &str) {
        self.backend_status = BackendStatus::Offline;
        self.tools = vec![format!("Backend offline ({})", reason)];
        self.tool_details.clear();
        self.selected_tool = None;
    }

    /// Any slice error, including one only on executions, takes the tool
    /// panel offline. The execution list is cleared only for its own error.
    pub(crate) fn apply_meta(&mut self, meta: DashboardMeta) {
        if meta.errors.any() {
            self.mark_offline(meta.errors.first().unwrap_or("unknown error"));
        } else {
            self.backend_status = BackendStatus::Ok;
            self.tools = meta.tools;
            self.tool_details = meta.tool_details;
            if self.selected_tool.is_none() {
                self.selected_tool = self.tool_details.first().cloned();
            }
        }

        self.executions = if meta.errors.executions.is_some() {
            Vec::new()
        } else {
            meta.executions
        };
    }

    pub(crate) fn apply_meta_failure(&mut self, reason: &str) {
        self.mark_offline(reason);
        self.executions.clear();
    }

    pub(crate) fn select_tool(&mut self, name: &str) {
        self.selected_tool = self
            .tool_details
            .iter()
            .find(|tool| tool.name == name)
            .cloned();
    }
}

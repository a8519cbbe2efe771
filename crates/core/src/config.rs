//! Runtime configuration reported to the dashboard

use serde::{Deserialize, Serialize};

pub const DEFAULT_NAME: &str = "Specter";
pub const DEFAULT_AGENT: &str = "default";
pub const DEFAULT_USER_ID: &str = "local";
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Effective configuration as seen by the UI.
///
/// `backend_url` is always the gateway's own knowledge of where the backend
/// lives; values reported by the backend never replace it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub name: String,
    pub default_agent: String,
    pub default_user_id: String,
    pub data_dir: String,
    pub backend_url: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            default_agent: DEFAULT_AGENT.to_string(),
            default_user_id: DEFAULT_USER_ID.to_string(),
            data_dir: DEFAULT_DATA_DIR.to_string(),
            backend_url: String::new(),
        }
    }
}

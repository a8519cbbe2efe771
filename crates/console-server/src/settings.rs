//! Process configuration, read once at startup

use std::net::SocketAddr;
use std::time::Duration;

use console_core::config::{DEFAULT_AGENT, DEFAULT_DATA_DIR, DEFAULT_NAME, DEFAULT_USER_ID};
use console_core::Configuration;
use tracing::warn;

/// Backend used by the proxies when `BACKEND_URL` is not set
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

/// Upper bound of each backend operation
#[derive(Debug, Clone)]
pub struct GatewayTimeouts {
    pub config: Duration,
    pub execution: Duration,
    pub replay: Duration,
    pub run: Duration,
    pub entities: Duration,
    pub summarize: Duration,
    pub summaries: Duration,
    pub search: Duration,
    pub meta: Duration,
    pub health: Duration,
}

impl Default for GatewayTimeouts {
    fn default() -> Self {
        Self {
            config: Duration::from_secs(3),
            execution: Duration::from_secs(5),
            replay: Duration::from_secs(15),
            run: Duration::from_secs(60),
            entities: Duration::from_secs(5),
            summarize: Duration::from_secs(15),
            summaries: Duration::from_secs(5),
            search: Duration::from_secs(5),
            meta: Duration::from_secs(5),
            health: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConsoleSettings {
    /// Backend location as configured; `None` when the operator set nothing
    pub backend_url: Option<String>,
    pub name: String,
    pub default_agent: String,
    pub default_user_id: String,
    pub data_dir: String,
    pub listen_addr: SocketAddr,
    pub timeouts: GatewayTimeouts,
}

fn env_value(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl ConsoleSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let listen_addr = match env_value(&lookup, "CONSOLE_ADDR") {
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                warn!("Invalid CONSOLE_ADDR {:?} ({}), using {}", raw, err, DEFAULT_LISTEN_ADDR);
                default_listen_addr()
            }),
            None => default_listen_addr(),
        };

        Self {
            backend_url: env_value(&lookup, "BACKEND_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            name: env_value(&lookup, "SPECTER_NAME").unwrap_or_else(|| DEFAULT_NAME.to_string()),
            default_agent: env_value(&lookup, "SPECTER_DEFAULT_AGENT")
                .unwrap_or_else(|| DEFAULT_AGENT.to_string()),
            default_user_id: env_value(&lookup, "SPECTER_DEFAULT_USER_ID")
                .unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            data_dir: env_value(&lookup, "SPECTER_DATA_DIR")
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
            listen_addr,
            timeouts: GatewayTimeouts::default(),
        }
    }

    /// Backend the proxies talk to
    pub fn proxy_backend_url(&self) -> &str {
        self.backend_url.as_deref().unwrap_or(DEFAULT_BACKEND_URL)
    }

    /// Configuration reported when the backend has nothing better to say
    pub fn fallback_configuration(&self) -> Configuration {
        Configuration {
            name: self.name.clone(),
            default_agent: self.default_agent.clone(),
            default_user_id: self.default_user_id.clone(),
            data_dir: self.data_dir.clone(),
            backend_url: self.backend_url.clone().unwrap_or_default(),
        }
    }
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

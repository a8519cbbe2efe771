//! Application state

use std::sync::Arc;

use backend_client::BackendClient;

use crate::settings::{ConsoleSettings, GatewayTimeouts};

/// Shared application state. Immutable after startup, so handlers need no locking.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    settings: ConsoleSettings,
    backend: BackendClient,
}

impl AppState {
    pub fn new(settings: ConsoleSettings) -> Self {
        let backend = BackendClient::new(settings.proxy_backend_url());
        Self {
            inner: Arc::new(AppStateInner { settings, backend }),
        }
    }

    pub fn settings(&self) -> &ConsoleSettings {
        &self.inner.settings
    }

    pub fn timeouts(&self) -> &GatewayTimeouts {
        &self.inner.settings.timeouts
    }

    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }
}

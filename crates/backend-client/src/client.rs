use std::time::Duration;

use reqwest::{header::CONTENT_TYPE, Client, RequestBuilder};
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use crate::error::{BackendError, Result};

/// Point in time after which a backend call is abandoned.
///
/// Several calls may share one deadline so they are bounded together.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    bound: Duration,
}

impl Deadline {
    pub fn after(bound: Duration) -> Self {
        Self {
            at: Instant::now() + bound,
            bound,
        }
    }

    pub fn bound(&self) -> Duration {
        self.bound
    }
}

/// Status and JSON body of a backend response, untouched
#[derive(Debug, Clone, PartialEq)]
pub struct BackendResponse {
    pub status: u16,
    pub body: Value,
}

impl BackendResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `error` field carried in the body, if the backend set one
    pub fn reported_error(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }

    /// Fails with [`BackendError::Backend`] when the status or body reports an error
    pub fn into_checked(self) -> Result<Self> {
        if let Some(message) = self.reported_error() {
            return Err(BackendError::backend(self.status, message));
        }
        if !self.is_success() {
            return Err(BackendError::backend(
                self.status,
                format!("unexpected status {}", self.status),
            ));
        }
        Ok(self)
    }
}

/// Client for the task-execution backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            // Backend is local infrastructure; never route through a proxy
            client: Client::builder()
                .no_proxy()
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        deadline: Option<Deadline>,
    ) -> Result<BackendResponse> {
        debug!(path, "GET backend");
        let request = self.client.get(self.url(path)).query(query);
        self.dispatch(request, deadline).await
    }

    pub async fn post(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        deadline: Option<Deadline>,
    ) -> Result<BackendResponse> {
        debug!(path, "POST backend");
        let mut request = self
            .client
            .post(self.url(path))
            .query(query)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        self.dispatch(request, deadline).await
    }

    /// Sends the request and decodes the JSON body.
    ///
    /// Hitting the deadline drops the in-flight exchange, which aborts the
    /// connection; the timer is owned by the same future and goes with it.
    async fn dispatch(
        &self,
        request: RequestBuilder,
        deadline: Option<Deadline>,
    ) -> Result<BackendResponse> {
        let exchange = async move {
            let response = request.send().await.map_err(BackendError::from_transport)?;
            let status = response.status().as_u16();
            let bytes = response
                .bytes()
                .await
                .map_err(BackendError::from_transport)?;
            let body = serde_json::from_slice(&bytes)
                .map_err(|e| BackendError::malformed(format!("status {}: {}", status, e)))?;
            Ok(BackendResponse { status, body })
        };

        match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline.at, exchange)
                .await
                .map_err(|_| BackendError::Timeout {
                    after: deadline.bound,
                })?,
            None => exchange.await,
        }
    }

    // ------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------

    pub async fn health(&self, deadline: Option<Deadline>) -> Result<BackendResponse> {
        self.get("/health", &[], deadline).await
    }

    pub async fn config(&self, deadline: Option<Deadline>) -> Result<BackendResponse> {
        self.get("/config", &[], deadline).await
    }

    pub async fn tools(&self, deadline: Option<Deadline>) -> Result<BackendResponse> {
        self.get("/tools", &[], deadline).await
    }

    pub async fn list_executions(&self, deadline: Option<Deadline>) -> Result<BackendResponse> {
        self.get("/executions", &[], deadline).await
    }

    pub async fn execution(&self, id: &str, deadline: Option<Deadline>) -> Result<BackendResponse> {
        let path = format!("/executions/{}", urlencoding::encode(id));
        self.get(&path, &[], deadline).await
    }

    pub async fn replay_execution(
        &self,
        id: &str,
        deadline: Option<Deadline>,
    ) -> Result<BackendResponse> {
        let path = format!("/executions/{}/replay", urlencoding::encode(id));
        self.post(&path, &[], None, deadline).await
    }

    /// Submits a run through the backend's test webhook channel
    pub async fn run(&self, body: &Value, deadline: Option<Deadline>) -> Result<BackendResponse> {
        self.post("/webhook/test", &[], Some(body), deadline).await
    }

    pub async fn entities(
        &self,
        params: &[(&str, String)],
        deadline: Option<Deadline>,
    ) -> Result<BackendResponse> {
        self.get("/knowledge/entities/list", params, deadline).await
    }

    pub async fn summarize(
        &self,
        user_id: &str,
        deadline: Option<Deadline>,
    ) -> Result<BackendResponse> {
        self.post(
            "/knowledge/summarize",
            &[("user_id", user_id.to_string())],
            None,
            deadline,
        )
        .await
    }

    pub async fn summaries(
        &self,
        user_id: &str,
        deadline: Option<Deadline>,
    ) -> Result<BackendResponse> {
        self.get(
            "/knowledge/summaries",
            &[("user_id", user_id.to_string())],
            deadline,
        )
        .await
    }

    pub async fn search(
        &self,
        q: &str,
        user_id: &str,
        deadline: Option<Deadline>,
    ) -> Result<BackendResponse> {
        self.get(
            "/knowledge/search",
            &[("q", q.to_string()), ("user_id", user_id.to_string())],
            deadline,
        )
        .await
    }
}

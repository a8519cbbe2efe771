//! Gateway access used by the synchronizer

use async_trait::async_trait;
use console_core::{DashboardMeta, Entity, EntityQuery, RunRequest, RunResult, Summary};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SyncError};

/// Gateway operations the dashboard depends on
#[async_trait]
pub trait ConsoleApi: Send + Sync {
    /// Aggregated tool catalog and execution timeline.
    ///
    /// A degraded payload (per-slice errors, even with a 502) is still `Ok`.
    async fn meta(&self) -> Result<DashboardMeta>;

    /// Submits a run; any JSON answer, including an error envelope, is `Ok`
    async fn run(&self, request: &RunRequest) -> Result<RunResult>;

    async fn summarize(&self) -> Result<Value>;

    async fn summaries(&self) -> Result<Vec<Summary>>;

    async fn search_entities(&self, query: &EntityQuery) -> Result<Vec<Entity>>;
}

/// HTTP implementation of [`ConsoleApi`] against the console gateway
#[derive(Debug, Clone)]
pub struct ConsoleClient {
    client: Client,
    base_url: String,
}

impl ConsoleClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn read_body(response: Response) -> Result<(u16, Value)> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await?;
    let body = serde_json::from_slice(&bytes)?;
    Ok((status, body))
}

fn envelope_error(status: u16, body: &Value) -> Option<SyncError> {
    let error = body.get("error")?.as_str()?;
    Some(SyncError::Gateway {
        status,
        error: error.to_string(),
        detail: body
            .get("detail")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

/// Extracts a list field, failing on the gateway's error envelope
fn list_field<T: DeserializeOwned>(status: u16, mut body: Value, field: &str) -> Result<Vec<T>> {
    if let Some(err) = envelope_error(status, &body) {
        return Err(err);
    }
    match body.get_mut(field).map(Value::take) {
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(items) => Ok(serde_json::from_value(items)?),
    }
}

#[async_trait]
impl ConsoleApi for ConsoleClient {
    async fn meta(&self) -> Result<DashboardMeta> {
        let response = self.client.get(self.url("/meta")).send().await?;
        let (status, body) = read_body(response).await?;
        debug!(status, "Dashboard meta received");
        Ok(serde_json::from_value(body)?)
    }

    async fn run(&self, request: &RunRequest) -> Result<RunResult> {
        let response = self
            .client
            .post(self.url("/run"))
            .json(request)
            .send()
            .await?;
        let (_, body) = read_body(response).await?;
        Ok(RunResult::from_value(body)?)
    }

    async fn summarize(&self) -> Result<Value> {
        let response = self
            .client
            .post(self.url("/memory/summarize"))
            .send()
            .await?;
        let (status, body) = read_body(response).await?;
        match envelope_error(status, &body) {
            Some(err) => Err(err),
            None => Ok(body),
        }
    }

    async fn summaries(&self) -> Result<Vec<Summary>> {
        let response = self.client.get(self.url("/memory/summary")).send().await?;
        let (status, body) = read_body(response).await?;
        list_field(status, body, "summaries")
    }

    async fn search_entities(&self, query: &EntityQuery) -> Result<Vec<Entity>> {
        let response = self
            .client
            .get(self.url("/memory/entities"))
            .query(&query.gateway_params())
            .send()
            .await?;
        let (status, body) = read_body(response).await?;
        list_field(status, body, "entities")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::RawQuery,
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;

    async fn spawn_gateway(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn degraded_meta_is_still_decoded() {
        let url = spawn_gateway(Router::new().route(
            "/meta",
            get(|| async {
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({
                        "tools": [], "executions": [],
                        "errors": { "tools": "backend_unreachable", "executions": "backend_unreachable" },
                        "detail": "connection refused"
                    })),
                )
            }),
        ))
        .await;

        let meta = ConsoleClient::new(url).meta().await.unwrap();
        assert_eq!(meta.errors.tools.as_deref(), Some("backend_unreachable"));
        assert_eq!(meta.detail.as_deref(), Some("connection refused"));
    }

    #[tokio::test]
    async fn run_trace_is_returned_whole() {
        let payload = json!({
            "result": { "execution_id": "e9", "result": "done" },
            "events": [
                { "event": "start", "node": "plan", "progress": { "step": 1 } },
                { "event": "healing_failed", "node": "plan", "fix": { "strategy": "retry" } }
            ]
        });
        let reply = payload.clone();
        let url = spawn_gateway(Router::new().route(
            "/run",
            post(move || {
                let reply = reply.clone();
                async move { Json(reply) }
            }),
        ))
        .await;

        let result = ConsoleClient::new(url)
            .run(&RunRequest::new("plan the launch"))
            .await
            .unwrap();
        assert_eq!(result.execution_id(), Some("e9"));
        assert_eq!(serde_json::to_value(&result).unwrap(), payload);
    }

    #[tokio::test]
    async fn entity_search_sends_shaped_query() {
        let url = spawn_gateway(Router::new().route(
            "/memory/entities",
            get(|RawQuery(query): RawQuery| async move {
                Json(json!({ "entities": [{ "id": query.unwrap_or_default(), "type": "topic", "name": "n" }] }))
            }),
        ))
        .await;

        let entities = ConsoleClient::new(url)
            .search_entities(&EntityQuery::new().text("acme").of_type("all"))
            .await
            .unwrap();
        assert_eq!(entities[0].id, "q=acme&limit=20");
    }

    #[tokio::test]
    async fn error_envelope_becomes_gateway_error() {
        let url = spawn_gateway(Router::new().route(
            "/memory/summarize",
            post(|| async {
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({ "error": "backend_unreachable", "detail": "timed out" })),
                )
            }),
        ))
        .await;

        let err = ConsoleClient::new(url).summarize().await.unwrap_err();
        match err {
            SyncError::Gateway { status, error, .. } => {
                assert_eq!(status, 502);
                assert_eq!(error, "backend_unreachable");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn run_envelope_is_kept_as_result() {
        let url = spawn_gateway(Router::new().route(
            "/run",
            post(|| async {
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({ "error": "backend_unreachable", "detail": "refused" })),
                )
            }),
        ))
        .await;

        let result = ConsoleClient::new(url)
            .run(&RunRequest::new("hi"))
            .await
            .unwrap();
        assert_eq!(result.error(), Some("backend_unreachable"));
    }

    #[tokio::test]
    async fn missing_summaries_field_is_empty() {
        let url = spawn_gateway(
            Router::new().route("/memory/summary", get(|| async { Json(json!({})) })),
        )
        .await;

        let summaries = ConsoleClient::new(url).summaries().await.unwrap();
        assert!(summaries.is_empty());
    }
}

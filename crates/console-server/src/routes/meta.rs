//! Dashboard aggregation endpoint
//!
//! `GET /meta` loads the tool catalog and the execution timeline in one round
//! trip. Both backend calls run concurrently under one shared deadline and
//! each slice fails on its own.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use backend_client::{BackendError, BackendResponse, Deadline};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::BACKEND_UNREACHABLE;
use crate::state::AppState;

#[derive(Debug, Serialize, Default)]
struct SliceErrors {
    tools: Option<String>,
    executions: Option<String>,
}

#[derive(Debug, Serialize, Default)]
struct MetaResponse {
    tools: Vec<Value>,
    tool_details: Vec<Value>,
    executions: Vec<Value>,
    errors: SliceErrors,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

fn array_field(body: &Value, field: &str) -> Vec<Value> {
    body.get(field)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn is_transport_failure(err: &BackendError) -> bool {
    !matches!(err, BackendError::Backend { .. })
}

async fn get_meta(State(state): State<AppState>) -> (StatusCode, Json<MetaResponse>) {
    let deadline = Deadline::after(state.timeouts().meta);
    let backend = state.backend();

    let (tools, executions) = tokio::join!(
        async {
            backend
                .tools(Some(deadline))
                .await
                .and_then(BackendResponse::into_checked)
        },
        async {
            backend
                .list_executions(Some(deadline))
                .await
                .and_then(BackendResponse::into_checked)
        },
    );

    if let (Err(tools_err), Err(exec_err)) = (&tools, &executions) {
        if is_transport_failure(tools_err) && is_transport_failure(exec_err) {
            warn!(
                tools = %tools_err,
                executions = %exec_err,
                "Backend unreachable for dashboard meta"
            );
            let payload = MetaResponse {
                errors: SliceErrors {
                    tools: Some(BACKEND_UNREACHABLE.to_string()),
                    executions: Some(BACKEND_UNREACHABLE.to_string()),
                },
                detail: Some(tools_err.to_string()),
                ..MetaResponse::default()
            };
            return (StatusCode::BAD_GATEWAY, Json(payload));
        }
    }

    let mut payload = MetaResponse::default();

    match tools {
        Ok(response) => {
            payload.tools = array_field(&response.body, "tools");
            payload.tool_details = array_field(&response.body, "details");
        }
        Err(err) => {
            warn!(kind = err.kind(), "Tool catalog unavailable: {}", err);
            payload.errors.tools = Some(err.to_string());
        }
    }

    match executions {
        Ok(response) => payload.executions = array_field(&response.body, "executions"),
        Err(err) => {
            warn!(kind = err.kind(), "Execution list unavailable: {}", err);
            payload.errors.executions = Some(err.to_string());
        }
    }

    (StatusCode::OK, Json(payload))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/meta", get(get_meta))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::{json, Value};

    use crate::testing::{get_json, settings_for, spawn_backend, unreachable_url};

    async fn executions() -> Json<Value> {
        Json(json!({ "executions": [{ "id": "e1", "intent": "plan", "status": "completed" }] }))
    }

    async fn tools() -> Json<Value> {
        Json(json!({
            "tools": ["calc", "web"],
            "details": [{ "name": "calc", "description": "math", "params": { "expr": "str" } }]
        }))
    }

    #[tokio::test]
    async fn merges_both_slices() {
        let url = spawn_backend(
            Router::new()
                .route("/tools", get(tools))
                .route("/executions", get(executions)),
        )
        .await;

        let (status, body) = get_json(settings_for(Some(url)), "/meta").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tools"], json!(["calc", "web"]));
        assert_eq!(body["tool_details"][0]["name"], "calc");
        assert_eq!(body["executions"][0]["id"], "e1");
        assert_eq!(body["errors"], json!({ "tools": null, "executions": null }));
    }

    #[tokio::test]
    async fn tool_failure_keeps_executions() {
        let url = spawn_backend(
            Router::new()
                .route(
                    "/tools",
                    get(|| async {
                        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "registry down" })))
                    }),
                )
                .route("/executions", get(executions)),
        )
        .await;

        let (status, body) = get_json(settings_for(Some(url)), "/meta").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tools"], json!([]));
        assert_eq!(body["executions"].as_array().unwrap().len(), 1);
        assert!(body["errors"]["tools"].as_str().unwrap().contains("registry down"));
        assert!(body["errors"]["executions"].is_null());
    }

    #[tokio::test]
    async fn slow_slice_times_out_alone() {
        let url = spawn_backend(
            Router::new()
                .route("/tools", get(tools))
                .route(
                    "/executions",
                    get(|| async {
                        tokio::time::sleep(Duration::from_secs(2)).await;
                        executions().await
                    }),
                ),
        )
        .await;

        let (status, body) = get_json(settings_for(Some(url)), "/meta").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tools"], json!(["calc", "web"]));
        assert_eq!(body["executions"], json!([]));
        assert!(body["errors"]["executions"].as_str().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn unreachable_backend_degrades_both_slices() {
        let (status, body) = get_json(settings_for(Some(unreachable_url().await)), "/meta").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["tools"], json!([]));
        assert_eq!(body["executions"], json!([]));
        assert_eq!(body["errors"]["tools"], "backend_unreachable");
        assert_eq!(body["errors"]["executions"], "backend_unreachable");
        assert!(body["detail"].is_string());
    }
}

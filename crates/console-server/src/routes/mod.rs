//! Route handlers
//!
//! Every proxy handler forwards to exactly one backend resource and either
//! passes the backend's status and body through unchanged or answers with
//! the 502 `backend_unreachable` envelope.

pub mod config;
pub mod executions;
pub mod health;
pub mod memory;
pub mod meta;
pub mod run;

use axum::{http::StatusCode, Json, Router};
use backend_client::{BackendError, BackendResponse};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::state::AppState;

pub const BACKEND_UNREACHABLE: &str = "backend_unreachable";

pub const INVALID_QUERY: &str = "invalid_query";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: String,
}

pub type RouteError = (StatusCode, Json<ErrorResponse>);

pub type ProxyResult = Result<(StatusCode, Json<Value>), RouteError>;

fn backend_unreachable(operation: &str, err: BackendError) -> RouteError {
    warn!(operation, kind = err.kind(), "Backend call failed: {}", err);
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error: BACKEND_UNREACHABLE.to_string(),
            detail: err.to_string(),
        }),
    )
}

/// 400 in the same envelope as backend failures
fn invalid_query(detail: impl Into<String>) -> RouteError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: INVALID_QUERY.to_string(),
            detail: detail.into(),
        }),
    )
}

fn pass_through(response: BackendResponse) -> (StatusCode, Json<Value>) {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(response.body))
}

/// Turns a backend outcome into the gateway's response
fn proxied(operation: &str, outcome: backend_client::Result<BackendResponse>) -> ProxyResult {
    outcome
        .map(pass_through)
        .map_err(|err| backend_unreachable(operation, err))
}

/// All gateway routes
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(config::router())
        .merge(executions::router())
        .merge(run::router())
        .merge(memory::router())
        .merge(meta::router())
}

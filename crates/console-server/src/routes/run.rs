//! Run submission proxy

use axum::{extract::State, routing::post, Json, Router};
use backend_client::Deadline;
use serde_json::Value;
use tracing::info;

use super::{proxied, ProxyResult};
use crate::state::AppState;

/// POST /run - body `{text, agent_id?}` is forwarded verbatim
async fn submit_run(State(state): State<AppState>, Json(body): Json<Value>) -> ProxyResult {
    let agent_id = body.get("agent_id").and_then(Value::as_str).unwrap_or("-");
    info!(agent_id, "Submitting run");
    let deadline = Deadline::after(state.timeouts().run);
    proxied("submit_run", state.backend().run(&body, Some(deadline)).await)
}

pub fn router() -> Router<AppState> {
    Router::new().route("/run", post(submit_run))
}

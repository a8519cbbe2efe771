//! Execution timeline proxies

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use backend_client::Deadline;

use super::{proxied, ProxyResult};
use crate::state::AppState;

/// GET /executions - unbounded pass-through of the timeline
async fn list_executions(State(state): State<AppState>) -> ProxyResult {
    proxied(
        "list_executions",
        state.backend().list_executions(None).await,
    )
}

/// GET /executions/{id}
async fn get_execution(State(state): State<AppState>, Path(id): Path<String>) -> ProxyResult {
    let deadline = Deadline::after(state.timeouts().execution);
    proxied(
        "get_execution",
        state.backend().execution(&id, Some(deadline)).await,
    )
}

/// POST /executions/{id}/replay
async fn replay_execution(State(state): State<AppState>, Path(id): Path<String>) -> ProxyResult {
    let deadline = Deadline::after(state.timeouts().replay);
    proxied(
        "replay_execution",
        state.backend().replay_execution(&id, Some(deadline)).await,
    )
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/executions", get(list_executions))
        .route("/executions/{id}", get(get_execution))
        .route("/executions/{id}/replay", post(replay_execution))
}

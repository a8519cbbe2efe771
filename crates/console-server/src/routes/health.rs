//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use backend_client::Deadline;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    backend_url: String,
    backend_reachable: bool,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let deadline = Deadline::after(state.timeouts().health);
    let backend_reachable = state
        .backend()
        .health(Some(deadline))
        .await
        .map(|response| response.is_success())
        .unwrap_or(false);

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        backend_url: state.backend().base_url().to_string(),
        backend_reachable,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

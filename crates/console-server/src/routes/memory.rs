//! Knowledge store proxies
//!
//! The console runs in single-user mode: every request is scoped to the
//! configured default user unless the caller names one explicitly.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::{get, post},
    Router,
};
use backend_client::Deadline;
use console_core::EntityQuery;
use serde::Deserialize;

use super::{invalid_query, proxied, ProxyResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
struct SummarizeQuery {
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

fn normalize_user_id(raw: Option<String>) -> Option<String> {
    raw.map(|user_id| user_id.trim().to_string())
        .filter(|user_id| !user_id.is_empty())
}

/// GET /memory/entities?q=&type=&limit=
async fn search_entities(
    State(state): State<AppState>,
    query: Result<Query<EntityQuery>, QueryRejection>,
) -> ProxyResult {
    let Query(query) = query.map_err(|rejection| invalid_query(rejection.body_text()))?;
    let params = query.backend_params(&state.settings().default_user_id);
    let deadline = Deadline::after(state.timeouts().entities);
    proxied(
        "search_entities",
        state.backend().entities(&params, Some(deadline)).await,
    )
}

/// POST /memory/summarize[?user_id=]
async fn summarize(
    State(state): State<AppState>,
    query: Result<Query<SummarizeQuery>, QueryRejection>,
) -> ProxyResult {
    let Query(query) = query.map_err(|rejection| invalid_query(rejection.body_text()))?;
    let user_id = normalize_user_id(query.user_id)
        .unwrap_or_else(|| state.settings().default_user_id.clone());
    let deadline = Deadline::after(state.timeouts().summarize);
    proxied(
        "summarize",
        state.backend().summarize(&user_id, Some(deadline)).await,
    )
}

/// GET /memory/summary - stored summaries of the default user
async fn list_summaries(State(state): State<AppState>) -> ProxyResult {
    let deadline = Deadline::after(state.timeouts().summaries);
    proxied(
        "list_summaries",
        state
            .backend()
            .summaries(&state.settings().default_user_id, Some(deadline))
            .await,
    )
}

/// GET /memory/search?q=
async fn search_knowledge(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ProxyResult {
    let Query(query) = query.map_err(|rejection| invalid_query(rejection.body_text()))?;
    let q = query.q.trim();
    if q.is_empty() {
        return Err(invalid_query("q is required"));
    }
    let deadline = Deadline::after(state.timeouts().search);
    proxied(
        "search_knowledge",
        state
            .backend()
            .search(q, &state.settings().default_user_id, Some(deadline))
            .await,
    )
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/memory/entities", get(search_entities))
        .route("/memory/summarize", post(summarize))
        .route("/memory/summary", get(list_summaries))
        .route("/memory/search", get(search_knowledge))
}

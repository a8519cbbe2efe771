//! Config Resolver
//!
//! `GET /config` never fails: any problem reaching the backend falls back to
//! the startup configuration with a 200.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use backend_client::{BackendError, Deadline};
use serde_json::Value;
use tracing::{debug, warn};

use crate::state::AppState;

/// Resolves the effective configuration for one request. Nothing is cached.
pub async fn resolve_config(state: &AppState) -> (StatusCode, Value) {
    let settings = state.settings();
    let fallback = settings.fallback_configuration();
    let fallback_value = serde_json::to_value(&fallback).unwrap_or(Value::Null);

    let Some(backend_url) = settings.backend_url.as_deref() else {
        debug!("No backend configured, serving fallback configuration");
        return (StatusCode::OK, fallback_value);
    };

    let deadline = Deadline::after(state.timeouts().config);
    let outcome = state
        .backend()
        .config(Some(deadline))
        .await
        .and_then(|response| response.into_checked());

    let response = match outcome {
        Ok(response) => response,
        Err(err) => {
            warn!(kind = err.kind(), "Backend config unavailable, using fallback: {}", err);
            return (StatusCode::OK, fallback_value);
        }
    };

    let reported = match response.body {
        Value::Object(map) => map,
        other => {
            let err = BackendError::malformed(format!("expected an object, got {}", other));
            warn!(kind = err.kind(), "Backend config unusable, using fallback: {}", err);
            return (StatusCode::OK, fallback_value);
        }
    };

    let mut merged = match fallback_value {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    merged.extend(reported);
    merged.insert(
        "backend_url".to_string(),
        Value::String(backend_url.to_string()),
    );

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::OK);
    (status, Value::Object(merged))
}

async fn get_config(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let (status, body) = resolve_config(&state).await;
    (status, Json(body))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/config", get(get_config))
}

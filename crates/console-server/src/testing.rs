//! Helpers shared by route tests

use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::routes;
use crate::settings::{ConsoleSettings, GatewayTimeouts};
use crate::state::AppState;

/// Serves `router` on an ephemeral local port and returns its base URL
pub async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// URL of a port nothing listens on
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Default settings with every bound shortened to keep tests fast
pub fn settings_for(backend_url: Option<String>) -> ConsoleSettings {
    let short = Duration::from_millis(300);
    ConsoleSettings {
        backend_url,
        timeouts: GatewayTimeouts {
            config: short,
            execution: short,
            replay: short,
            run: short,
            entities: short,
            summarize: short,
            summaries: short,
            search: short,
            meta: short,
            health: short,
        },
        ..ConsoleSettings::default()
    }
}

async fn send(settings: ConsoleSettings, request: Request<Body>) -> (StatusCode, Value) {
    let app = routes::router().with_state(AppState::new(settings));
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let payload = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, payload)
}

pub async fn get_json(settings: ConsoleSettings, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(settings, request).await
}

pub async fn post_json(
    settings: ConsoleSettings,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    let request = match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send(settings, request).await
}

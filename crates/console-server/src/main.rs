//! Specter console gateway
//!
//! Sits between the dashboard and the task-execution backend: resolves the
//! runtime configuration, proxies backend resources under per-operation
//! timeouts and serves the aggregated dashboard payload.

mod routes;
mod settings;
mod state;
#[cfg(test)]
mod testing;

use anyhow::Context;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::settings::ConsoleSettings;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "console_server=debug,backend_client=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = ConsoleSettings::from_env();
    match settings.backend_url.as_deref() {
        Some(url) => tracing::info!("Backend configured at {}", url),
        None => tracing::info!(
            "BACKEND_URL not set; config served from defaults, proxies use {}",
            settings.proxy_backend_url()
        ),
    }
    let listen_addr = settings.listen_addr;

    let app = routes::router()
        .with_state(AppState::new(settings))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind gateway on {}", listen_addr))?;
    tracing::info!("Console gateway listening on {}", listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", err);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down console gateway");
        })
        .await
        .context("gateway server error")?;

    Ok(())
}

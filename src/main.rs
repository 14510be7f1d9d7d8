//! padel-front: local match API in front of the padel REST backend.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use padel_front::{
    api::{auth::TokenStore, client::HttpBackend, config::ApiConfig},
    config::AppConfig,
    routes,
    state::{AppState, SharedState},
};

const DEFAULT_PORT: u16 = 8080;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let api_config = ApiConfig::from_env()
        .context("reading backend configuration")?
        .with_request_timeout(config.request_timeout());
    info!(base_url = %api_config.base_url, "using REST backend");

    // The client and the state share one token store so a rejected session is seen by both.
    let tokens = Arc::new(TokenStore::new());
    let backend =
        HttpBackend::new(api_config, Arc::clone(&tokens)).context("building backend client")?;
    let state = AppState::new(Arc::new(backend), tokens, config);
    let janitor = state.spawn_session_janitor();

    let addr = listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "padel-front listening");

    axum::serve(listener, app(state.clone()).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving local API")?;

    janitor.abort();
    state.sign_out().await;
    info!("padel-front stopped");
    Ok(())
}

fn app(state: SharedState) -> Router {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// `PORT`, then `SERVER_PORT`, then the default; unparsable values are ignored.
fn listen_addr() -> SocketAddr {
    let port = ["PORT", "SERVER_PORT"]
        .into_iter()
        .filter_map(|key| env::var(key).ok())
        .find_map(|value| match value.trim().parse::<u16>() {
            Ok(port) => Some(port),
            Err(err) => {
                warn!(%value, error = %err, "ignoring invalid port");
                None
            }
        })
        .unwrap_or(DEFAULT_PORT);
    SocketAddr::from(([0, 0, 0, 0], port))
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "SIGTERM handler unavailable; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown requested");
}

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tqs_engine::QueueEngine;
use tqs_store::Store;
use tracing::info;

use tqs_http::app::{build_router, AppState};
use tqs_http::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    if config.api_token.is_none() {
        tracing::warn!("no API token configured — every route is unauthenticated");
    }

    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock is before the unix epoch")
        .as_secs_f64();
    let store = Arc::new(
        Store::open(&config.database, now)
            .with_context(|| format!("failed to open database at `{}`", config.database))?,
    );

    let engine = Arc::new(QueueEngine::new(Arc::clone(&store)));
    let _sweepers =
        tqs_engine::spawn_sweepers(Arc::clone(&store), Arc::new(tqs_engine::SystemClock), Default::default());

    let app = build_router(AppState { engine }, config.api_token.clone());

    let listener = TcpListener::bind(config.socket_addr())
        .await
        .with_context(|| format!("failed to bind tqs listener on {}", config.socket_addr()))?;

    info!(addr = %config.socket_addr(), database = %config.database, "starting tqs server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("tqs server exited unexpectedly")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}

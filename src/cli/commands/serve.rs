use anyhow::Context;

use crate::app::{router, AppState};
use crate::config;

pub async fn handle(port: Option<u16>) -> anyhow::Result<()> {
    let config = config::config();
    tracing::info!("Starting agency portal in {:?} mode", config.environment);

    let state = AppState::from_config(config)?;
    let db = state.db.clone();
    let app = router(state, &config.security);

    let port = port.unwrap_or(config.server.port);
    let bind_addr = format!("{}:{}", config.server.host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Agency portal listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

pub mod app;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing::info;

pub use app::{build_router, AppState, ProxyConfig, DEFAULT_UPSTREAM_TIMEOUT};

/// Binds `bind` and relays `/api/*` to the configured backend until ctrl-c.
pub async fn serve(bind: &str, config: ProxyConfig) -> Result<()> {
    let state = AppState::new(&config).context("failed to build upstream HTTP client")?;
    let app = build_router(state);

    let socket: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid socket address {bind}"))?;
    let listener = tokio::net::TcpListener::bind(socket)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;

    info!(bind = %bind, backend = %config.backend_url, "trustbridge proxy listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await
        .context("axum server failed")
}

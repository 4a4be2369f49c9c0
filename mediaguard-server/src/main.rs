//! MediaGuard Server - REST API for content identification
//!
//! Exposes mediaguard-core functionality via HTTP endpoints:
//! - POST /api/v1/hashes - Register media and compute digests
//! - POST /api/v1/query/hashes/by-media - Find known content similar to media
//! - POST /api/v1/query/hashes/by-hash - Look up raw digests
//! - POST /api/v1/watermarks - Embed and record a watermark

use std::net::SocketAddr;

use mediaguard_server::{create_router_with_config, AppState, Config, IdentityBackend};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("mediaguard_server=info,mediaguard_core=info,tower_http=info")
        }))
        .init();

    let config = Config::from_env();

    let backend = IdentityBackend::connect(&config).await?;
    let state = AppState::with_builtin_algorithms(backend, &config)?;
    let app = create_router_with_config(&config, state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, version = env!("CARGO_PKG_VERSION"), "MediaGuard API listening");
    tracing::info!("API docs at http://{}/docs", addr);

    // Connect info feeds the per-IP rate limiter
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

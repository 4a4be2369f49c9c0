//! Router configuration module
//!
//! Configures all routes, middleware layers, and creates the application router.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method, StatusCode},
    routing::{get, post},
    Router,
};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::handlers::{
    create_hashes_handler, embed_watermark_handler, extract_watermark_handler, get_file_handler,
    health, list_hash_algorithms_handler, list_watermark_algorithms_handler, query_by_hash_handler,
    query_by_media_handler, ready, trace_origin_handler,
};
use crate::handlers::watermarks::{FILE_UUID_HEADER, POST_DIGEST_HEADER, RECORDING_HEADER};
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Create the application router with default config (for testing)
pub fn create_router(state: AppState) -> Router {
    create_router_with_config(&Config::default(), state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/hashes", post(create_hashes_handler))
        .route("/hashes/algorithms", get(list_hash_algorithms_handler))
        .route("/query/hashes/by-media", post(query_by_media_handler))
        .route("/query/hashes/by-hash", post(query_by_hash_handler))
        .route("/files/{uuid}", get(get_file_handler))
        .route("/watermarks", post(embed_watermark_handler))
        .route("/watermarks/algorithms", get(list_watermark_algorithms_handler))
        .route("/query/watermarks", post(extract_watermark_handler))
        .route("/query/watermarks/origin", post(trace_origin_handler))
}

/// Create the application router with custom configuration
pub fn create_router_with_config(config: &Config, state: AppState) -> Router {
    // Configure CORS based on allowed_origins
    let cors = match &config.allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            tracing::info!("CORS: Restricting to {} origin(s)", origins.len());
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
                .expose_headers([
                    header::CONTENT_DISPOSITION,
                    HeaderName::from_static(FILE_UUID_HEADER),
                    HeaderName::from_static(POST_DIGEST_HEADER),
                    HeaderName::from_static(RECORDING_HEADER),
                ])
        }
        _ => {
            tracing::warn!("CORS: Allowing all origins (dev mode)");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any)
        }
    };

    // Uploads are bounded by this layer instead of axum's 2 MB extractor default
    let body_limit = RequestBodyLimitLayer::new(config.body_limit_mb * 1024 * 1024);

    let timeout = TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.timeout_secs),
    );

    let router = Router::new()
        .nest("/api/v1", api_routes())
        .route("/health", get(health))
        .route("/ready", get(ready))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(DefaultBodyLimit::disable())
        .layer(body_limit)
        .layer(timeout);

    // Conditionally apply rate limiting (disabled in tests, enabled in production)
    let governor_conf = if config.rate_limit_enabled {
        GovernorConfigBuilder::default()
            .per_second(config.rate_limit_per_sec)
            .burst_size(config.rate_limit_burst)
            .finish()
    } else {
        None
    };

    match governor_conf {
        Some(conf) => {
            tracing::info!(
                "Rate limiting: {} req/s (burst: {})",
                config.rate_limit_per_sec,
                config.rate_limit_burst
            );
            router
                .layer(GovernorLayer::new(Arc::new(conf)))
                .layer(TraceLayer::new_for_http())
        }
        None => {
            if config.rate_limit_enabled {
                tracing::error!("Invalid rate limit settings, rate limiting DISABLED");
            } else {
                tracing::warn!("Rate limiting: DISABLED");
            }
            router.layer(TraceLayer::new_for_http())
        }
    }
}

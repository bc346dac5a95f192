//! REST API module using Axum
//!
//! Provides the HTTP surface of the gateway:
//! - `POST /api/v1/batches` — batch submission (the ingestion endpoint)
//! - `GET /api/v1/status` — cycle fill and lifetime counters
//! - `GET /health` — liveness probe

pub mod handlers;
mod routes;

pub use handlers::GatewayState;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::defaults;

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `EPIGATE_CORS_ORIGINS` to a comma-separated list of allowed origins
/// for development.
fn build_cors_layer() -> CorsLayer {
    match std::env::var("EPIGATE_CORS_ORIGINS") {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
        }
        Err(_) => CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
    }
}

/// Create the complete application router.
pub fn create_app(state: GatewayState) -> Router {
    let cors = build_cors_layer();

    Router::new()
        .nest("/api/v1", routes::api_routes(state.clone()))
        .merge(routes::legacy_routes(state))
        // Batches carry tens of thousands of records; the axum default
        // body limit is far too small for the real feeds.
        .layer(DefaultBodyLimit::max(defaults::MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

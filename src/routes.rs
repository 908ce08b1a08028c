//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /health`      - Health check (public)
//! - `/auth/*`, `/users/*`, `/admin/*` - JSON API, see [`crate::api::routes`]
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket on credential endpoints
//! - **Authorization** - Bearer token guard per route group
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::health_handler;
use crate::api::middleware::tracing;
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Builds the router with every route and middleware except path normalization.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `throttle_per_minute` - requests per minute and client IP allowed on
///   credential endpoints
pub fn router(state: AppState, throttle_per_minute: u32) -> anyhow::Result<Router> {
    let throttled = api::routes::throttled_routes(state.behind_proxy, throttle_per_minute)?;

    Ok(Router::new()
        .route("/health", get(health_handler))
        .merge(throttled)
        .merge(api::routes::access_routes(&state))
        .merge(api::routes::verified_routes(&state))
        .merge(api::routes::admin_routes(&state))
        .with_state(state)
        .layer(tracing::layer()))
}

/// Constructs the application router, trimming trailing slashes before routing.
pub fn app_router(
    state: AppState,
    throttle_per_minute: u32,
) -> anyhow::Result<NormalizePath<Router>> {
    Ok(NormalizePathLayer::trim_trailing_slash().layer(router(state, throttle_per_minute)?))
}

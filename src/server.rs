use axum::{
    middleware as axum_mw,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use crate::handlers::monitoring;
use crate::middleware::tracking;
use crate::AppState;

/// Builds the full Axum `Router` with the monitoring routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    let routes = Router::new()
        // ── Metrics ─────────────────────────────────────────────
        .route(
            "/api/monitoring/metrics",
            get(monitoring::get_summary).delete(monitoring::reset_metrics),
        )
        .route("/api/monitoring/requests", get(monitoring::get_request_stats))
        .route("/api/monitoring/errors", get(monitoring::get_error_stats))
        .route(
            "/api/monitoring/performance",
            get(monitoring::get_performance_stats),
        )
        // ── Liveness ────────────────────────────────────────────
        .route("/api/monitoring/health", get(monitoring::health))
        // ── Provide shared state to all routes above ────────────
        .with_state(state.clone());

    instrument(routes, state).layer(CorsLayer::permissive())
}

/// Wraps `router` so every request (matched or not) is recorded and
/// handler panics become recorded 500s. Layers apply bottom-up.
pub fn instrument(router: Router, state: Arc<AppState>) -> Router {
    router
        .layer(CatchPanicLayer::custom(tracking::panic_response))
        .layer(axum_mw::from_fn_with_state(state, tracking::track_requests))
}

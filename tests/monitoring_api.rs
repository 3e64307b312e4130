//! HTTP-level tests for request tracking and the monitoring endpoints.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::Path;
use axum::http::{Method, Request, StatusCode};
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use portal_metrics::config::Settings;
use portal_metrics::handlers::AppError;
use portal_metrics::metrics::{EndpointKey, RequestRecord};
use portal_metrics::{server, AppState};
use serde_json::Value;
use tower::ServiceExt;

fn state(allow_reset: bool) -> Arc<AppState> {
    let mut settings = Settings::default();
    settings.metrics.allow_reset = allow_reset;
    Arc::new(AppState::new(settings))
}

async fn find_item(Path(id): Path<u32>) -> Result<String, AppError> {
    if id == 42 {
        return Err(AppError::NotFound(format!("item '{id}' not found")));
    }
    Ok(format!("item {id}"))
}

async fn explode() -> &'static str {
    panic!("kaboom")
}

/// A small app with its own routes, wrapped in the tracking layers.
fn demo_app(state: Arc<AppState>) -> Router {
    let routes = Router::new()
        .route("/api/items/:id", get(find_item))
        .route("/api/explode", get(explode));
    server::instrument(routes, state)
}

async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_request_is_recorded_under_route_template() {
    let state = state(false);
    let app = demo_app(state.clone());

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/items/7").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-response-time-ms"));
    assert!(response.headers().contains_key("server-timing"));

    send(&app, Method::GET, "/api/items/8").await;

    let stats = state.metrics.request_stats(None);
    assert_eq!(stats.total, 2);
    let items = &stats.by_endpoint[&EndpointKey::new("GET", "/api/items/:id")];
    assert_eq!(items.count, 2);
    assert_eq!(items.errors, 0);
    assert_eq!(stats.by_status_code[&200], 2);
}

#[tokio::test]
async fn test_unrouted_request_is_recorded_without_query_string() {
    let state = state(false);
    let app = demo_app(state.clone());

    let (status, _) = send(&app, Method::GET, "/api/unknown?page=2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let stats = state.metrics.request_stats(None);
    assert_eq!(stats.total, 1);
    assert!(stats
        .by_endpoint
        .contains_key(&EndpointKey::new("GET", "/api/unknown")));
}

#[tokio::test]
async fn test_app_error_is_recorded_and_passed_through() {
    let state = state(false);
    let app = demo_app(state.clone());

    let (status, body) = send(&app, Method::GET, "/api/items/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "item '42' not found");
    assert_eq!(body["status"], 404);

    let errors = state.metrics.error_stats(None);
    assert_eq!(errors.total, 1);
    assert_eq!(errors.by_type["NotFound"], 1);
    assert_eq!(errors.by_endpoint[&EndpointKey::new("GET", "/api/items/:id")], 1);
    assert_eq!(errors.recent[0].message, "item '42' not found");

    let requests = state.metrics.request_stats(None);
    assert_eq!(requests.by_endpoint[&EndpointKey::new("GET", "/api/items/:id")].errors, 1);
}

#[tokio::test]
async fn test_path_rejection_is_recorded_as_error() {
    let state = state(false);
    let app = demo_app(state.clone());

    let (status, _) = send(&app, Method::GET, "/api/items/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let errors = state.metrics.error_stats(None);
    assert_eq!(errors.total, 1);
    assert_eq!(errors.by_type["Bad Request"], 1);
    assert_eq!(errors.by_endpoint[&EndpointKey::new("GET", "/api/items/:id")], 1);
    assert_eq!(errors.recent[0].message, "Unknown error");

    let requests = state.metrics.request_stats(None);
    assert_eq!(requests.total, 1);
    assert_eq!(requests.by_status_code[&400], 1);
}

#[tokio::test]
async fn test_method_not_allowed_is_recorded_as_error() {
    let state = state(false);
    let app = demo_app(state.clone());

    let (status, _) = send(&app, Method::POST, "/api/items/7").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let errors = state.metrics.error_stats(None);
    assert_eq!(errors.total, 1);
    assert_eq!(errors.by_type["Method Not Allowed"], 1);
}

#[tokio::test]
async fn test_unrouted_request_is_recorded_as_not_found_error() {
    let state = state(false);
    let app = demo_app(state.clone());

    send(&app, Method::GET, "/api/missing").await;

    let errors = state.metrics.error_stats(None);
    assert_eq!(errors.by_type["Not Found"], 1);
    assert_eq!(errors.by_endpoint[&EndpointKey::new("GET", "/api/missing")], 1);
}

#[tokio::test]
async fn test_successful_request_records_no_error() {
    let state = state(false);
    let app = demo_app(state.clone());

    send(&app, Method::GET, "/api/items/7").await;
    assert_eq!(state.metrics.error_stats(None).total, 0);
}

#[tokio::test]
async fn test_handler_panic_is_recorded() {
    let state = state(false);
    let app = demo_app(state.clone());

    let (status, body) = send(&app, Method::GET, "/api/explode").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], 500);

    let errors = state.metrics.error_stats(None);
    assert_eq!(errors.by_type["Panic"], 1);
    assert_eq!(errors.recent[0].message, "kaboom");
    assert_eq!(state.metrics.request_stats(None).by_status_code[&500], 1);
}

#[tokio::test]
async fn test_summary_reports_earlier_requests() {
    let state = state(false);
    let app = server::create_router(state);

    let (status, _) = send(&app, Method::GET, "/api/monitoring/health").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/api/monitoring/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requests"]["total"], 1);
    assert_eq!(
        body["requests"]["by_endpoint"]["GET:/api/monitoring/health"]["count"],
        1
    );
    assert_eq!(body["requests"]["by_status_code"]["200"], 1);
    assert_eq!(body["errors"]["total"], 0);
    assert!(body["uptime_seconds"].is_number());
}

#[tokio::test]
async fn test_time_window_filters_request_stats() {
    let state = state(false);
    let old = Utc::now() - chrono::Duration::minutes(5);
    state
        .metrics
        .record_request(RequestRecord::new("GET", "/api/old", 200, 10.0).at(old));
    let app = server::create_router(state);

    let (status, body) = send(&app, Method::GET, "/api/monitoring/requests?time_window=60").await;
    assert_eq!(status, StatusCode::OK);
    // The first monitoring call is recorded only after its response is built
    assert_eq!(body["total"], 0);
    assert_eq!(body["avg_response_time_ms"], 0.0);

    let (_, body) = send(&app, Method::GET, "/api/monitoring/requests").await;
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn test_invalid_time_window_is_a_recorded_bad_request() {
    let state = state(false);
    let app = server::create_router(state.clone());

    let (status, body) = send(&app, Method::GET, "/api/monitoring/errors?time_window=soon").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    let errors = state.metrics.error_stats(None);
    assert_eq!(errors.by_type["BadRequest"], 1);
    assert_eq!(
        errors.by_endpoint[&EndpointKey::new("GET", "/api/monitoring/errors")],
        1
    );
}

#[tokio::test]
async fn test_performance_endpoint_returns_latest_sample() {
    let state = state(false);
    let app = server::create_router(state.clone());

    let (_, body) = send(&app, Method::GET, "/api/monitoring/performance").await;
    assert!(body["current"].is_null());
    assert_eq!(body["average"]["resident_memory_bytes"], 0.0);

    state.metrics.record_performance();
    let (status, body) = send(&app, Method::GET, "/api/monitoring/performance").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["samples"], 1);
    assert!(body["current"]["resident_memory_bytes"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_reset_is_forbidden_by_default() {
    let state = state(false);
    let app = server::create_router(state.clone());
    send(&app, Method::GET, "/api/monitoring/health").await;

    let (status, _) = send(&app, Method::DELETE, "/api/monitoring/metrics").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(state.metrics.request_stats(None).total, 2);
    assert_eq!(state.metrics.error_stats(None).by_type["Forbidden"], 1);
}

#[tokio::test]
async fn test_reset_clears_histories_when_allowed() {
    let state = state(true);
    let app = server::create_router(state.clone());
    send(&app, Method::GET, "/api/monitoring/health").await;
    send(&app, Method::GET, "/api/monitoring/errors?time_window=x").await;
    state.metrics.record_performance();

    let (status, _) = send(&app, Method::DELETE, "/api/monitoring/metrics").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Only the reset request itself survives
    let requests = state.metrics.request_stats(None);
    assert_eq!(requests.total, 1);
    assert!(requests
        .by_endpoint
        .contains_key(&EndpointKey::new("DELETE", "/api/monitoring/metrics")));
    assert_eq!(state.metrics.error_stats(None).total, 0);
    assert_eq!(state.metrics.performance_stats().samples, 0);
}

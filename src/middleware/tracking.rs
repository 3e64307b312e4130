use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::handlers::ErrorInfo;
use crate::metrics::{ErrorRecord, RequestRecord};
use crate::AppState;

/// Records every request into the aggregator and adds two response headers:
///
///   X-Response-Time-Ms  : total handler wall time in milliseconds
///   Server-Timing       : same value in the standard Server-Timing format
///
/// Every response with status >= 400 is also recorded as an error, typed
/// from its [`ErrorInfo`] extension when a handler attached one and from the
/// status reason otherwise (extractor rejections, 404, 405). The response
/// itself goes back to the client untouched.
pub async fn track_requests(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    // Route template when matched; `path()` never includes the query string.
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed();
    let ms = elapsed.as_secs_f64() * 1000.0;

    // ── Inject response headers ─────────────────────────────────
    if let Ok(val) = format!("{ms:.3}").parse() {
        response.headers_mut().insert("x-response-time-ms", val);
    }
    if let Ok(val) = format!("total;dur={ms:.3}").parse() {
        response.headers_mut().insert("server-timing", val);
    }

    let status = response.status().as_u16();
    tracing::debug!(%method, %endpoint, status, elapsed_ms = ms, "request completed");

    // ── Record ──────────────────────────────────────────────────
    let error = match response.extensions().get::<ErrorInfo>() {
        Some(info) => Some(
            ErrorRecord::new(
                Some(info.error_type.as_str()),
                Some(info.message.as_str()),
                method.clone(),
                endpoint.clone(),
            )
            .with_stack_trace(info.stack_trace.clone()),
        ),
        None if status >= 400 => Some(ErrorRecord::new(
            response.status().canonical_reason(),
            None,
            method.clone(),
            endpoint.clone(),
        )),
        None => None,
    };
    if let Some(record) = error {
        state.metrics.record_error(record);
    }
    state
        .metrics
        .record_request(RequestRecord::new(method, endpoint, status, ms));

    response
}

/// Turns a handler panic into a 500 that the tracking middleware records
/// with error type `Panic`.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        String::new()
    };

    let status = StatusCode::INTERNAL_SERVER_ERROR;
    let body = serde_json::json!({
        "error":  "Internal server error",
        "status": status.as_u16(),
    });

    let mut response = (status, Json(body)).into_response();
    response.extensions_mut().insert(ErrorInfo {
        error_type: "Panic".into(),
        message,
        stack_trace: None,
    });
    response
}

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppError;
use crate::metrics::{
    ErrorStatsSummary, MetricsSummary, PerformanceStatsSummary, RequestStatsSummary,
};
use crate::AppState;

// ─── Request / response types ────────────────────────────────────

/// `?time_window=<seconds>` on the read endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub time_window: Option<u64>,
}

impl WindowQuery {
    fn window(&self) -> Option<Duration> {
        self.time_window.map(Duration::from_secs)
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub uptime_seconds: u64,
}

fn window_from(query: Result<Query<WindowQuery>, QueryRejection>) -> Result<Option<Duration>, AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    Ok(query.window())
}

// ─── GET /api/monitoring/metrics ─────────────────────────────────

pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    query: Result<Query<WindowQuery>, QueryRejection>,
) -> Result<Json<MetricsSummary>, AppError> {
    let window = window_from(query)?;
    Ok(Json(state.metrics.summary(window)))
}

// ─── GET /api/monitoring/requests ────────────────────────────────

pub async fn get_request_stats(
    State(state): State<Arc<AppState>>,
    query: Result<Query<WindowQuery>, QueryRejection>,
) -> Result<Json<RequestStatsSummary>, AppError> {
    let window = window_from(query)?;
    Ok(Json(state.metrics.request_stats(window)))
}

// ─── GET /api/monitoring/errors ──────────────────────────────────

pub async fn get_error_stats(
    State(state): State<Arc<AppState>>,
    query: Result<Query<WindowQuery>, QueryRejection>,
) -> Result<Json<ErrorStatsSummary>, AppError> {
    let window = window_from(query)?;
    Ok(Json(state.metrics.error_stats(window)))
}

// ─── GET /api/monitoring/performance ─────────────────────────────

pub async fn get_performance_stats(
    State(state): State<Arc<AppState>>,
) -> Json<PerformanceStatsSummary> {
    Json(state.metrics.performance_stats())
}

// ─── GET /api/monitoring/health ──────────────────────────────────

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        uptime_seconds: state.metrics.uptime().as_secs(),
    })
}

// ─── DELETE /api/monitoring/metrics ──────────────────────────────

pub async fn reset_metrics(State(state): State<Arc<AppState>>) -> Result<StatusCode, AppError> {
    if !state.settings.metrics.allow_reset {
        return Err(AppError::Forbidden("metrics reset is disabled".into()));
    }
    state.metrics.clear();
    tracing::info!("Metrics cleared by operator request");
    Ok(StatusCode::NO_CONTENT)
}

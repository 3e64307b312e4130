pub mod aggregator;
pub mod history;
pub mod percentiles;
pub mod process;
pub mod summary;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use aggregator::MetricsAggregator;
pub use summary::{
    EndpointKey, EndpointStats, ErrorStatsSummary, MetricsSummary, PerformanceFigures,
    PerformanceStatsSummary, RequestStatsSummary,
};

/// Label used when an error arrives without a type.
pub const DEFAULT_ERROR_TYPE: &str = "Error";

/// Label used when an error arrives without a message.
pub const DEFAULT_ERROR_MESSAGE: &str = "Unknown error";

/// Outcome of one completed HTTP request.
/// Built by the tracking middleware on the write side.
#[derive(Debug, Clone, Serialize)]
pub struct RequestRecord {
    /// e.g. "GET"
    pub method: String,
    /// Route template ("/api/items/:id") or the bare path when unrouted
    pub endpoint: String,
    pub status_code: u16,
    /// Wall time in milliseconds, never negative
    pub response_time_ms: f64,
    pub timestamp: DateTime<Utc>,
}

impl RequestRecord {
    /// Build a record stamped now. Negative or NaN durations become 0.
    pub fn new(
        method: impl Into<String>,
        endpoint: impl Into<String>,
        status_code: u16,
        response_time_ms: f64,
    ) -> Self {
        Self {
            method: method.into(),
            endpoint: endpoint.into(),
            status_code,
            response_time_ms: if response_time_ms > 0.0 { response_time_ms } else { 0.0 },
            timestamp: Utc::now(),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn key(&self) -> EndpointKey {
        EndpointKey::new(&self.method, &self.endpoint)
    }

    pub fn is_error(&self) -> bool {
        self.status_code >= 400
    }
}

/// An error observed while handling a request.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub error_type: String,
    pub message: String,
    pub endpoint: String,
    pub method: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

impl ErrorRecord {
    /// Build a record stamped now. A missing or blank type or message
    /// falls back to [`DEFAULT_ERROR_TYPE`] / [`DEFAULT_ERROR_MESSAGE`].
    pub fn new(
        error_type: Option<&str>,
        message: Option<&str>,
        method: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            error_type: label_or(error_type, DEFAULT_ERROR_TYPE),
            message: label_or(message, DEFAULT_ERROR_MESSAGE),
            endpoint: endpoint.into(),
            method: method.into(),
            timestamp: Utc::now(),
            stack_trace: None,
        }
    }

    pub fn with_stack_trace(mut self, stack_trace: Option<String>) -> Self {
        self.stack_trace = stack_trace.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn key(&self) -> EndpointKey {
        EndpointKey::new(&self.method, &self.endpoint)
    }
}

fn label_or(value: Option<&str>, fallback: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_owned(),
        _ => fallback.to_owned(),
    }
}

/// Point-in-time process resource usage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceSample {
    /// Cumulative user + system CPU time
    pub cpu_time_used_ms: u64,
    pub resident_memory_bytes: u64,
    pub virtual_memory_bytes: u64,
    pub timestamp: DateTime<Utc>,
}

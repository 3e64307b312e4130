use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};

use super::percentiles::PercentileSet;
use super::{ErrorRecord, PerformanceSample};

// ─── Grouping key ────────────────────────────────────────────────

/// Method + endpoint pair used to group records.
/// Renders as `METHOD:endpoint`, which is also its JSON map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointKey {
    pub method: String,
    pub endpoint: String,
}

impl EndpointKey {
    pub fn new(method: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            endpoint: endpoint.into(),
        }
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.method, self.endpoint)
    }
}

impl Serialize for EndpointKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ─── Request stats ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EndpointStats {
    pub count: usize,
    pub avg_response_time_ms: f64,
    /// Responses with status >= 400
    pub errors: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestStatsSummary {
    pub total: usize,
    pub by_endpoint: HashMap<EndpointKey, EndpointStats>,
    pub by_status_code: HashMap<u16, usize>,
    pub avg_response_time_ms: f64,
    pub response_time_percentiles: PercentileSet,
}

// ─── Error stats ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ErrorStatsSummary {
    pub total: usize,
    pub by_type: HashMap<String, usize>,
    pub by_endpoint: HashMap<EndpointKey, usize>,
    /// Tail of the window, most recent last
    pub recent: Vec<ErrorRecord>,
}

// ─── Performance stats ───────────────────────────────────────────

/// Per-field figures over the retained samples (mean or max).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerformanceFigures {
    pub cpu_time_used_ms: f64,
    pub resident_memory_bytes: f64,
    pub virtual_memory_bytes: f64,
}

impl PerformanceFigures {
    fn of(sample: &PerformanceSample) -> Self {
        Self {
            cpu_time_used_ms: sample.cpu_time_used_ms as f64,
            resident_memory_bytes: sample.resident_memory_bytes as f64,
            virtual_memory_bytes: sample.virtual_memory_bytes as f64,
        }
    }

    /// Mean and max across `samples`; both zeroed when there are none.
    pub(crate) fn mean_and_max<'a, I>(samples: I) -> (Self, Self)
    where
        I: IntoIterator<Item = &'a PerformanceSample>,
    {
        let mut sum = Self::default();
        let mut max = Self::default();
        let mut n = 0usize;

        for s in samples {
            let f = Self::of(s);
            sum.cpu_time_used_ms += f.cpu_time_used_ms;
            sum.resident_memory_bytes += f.resident_memory_bytes;
            sum.virtual_memory_bytes += f.virtual_memory_bytes;
            max.cpu_time_used_ms = max.cpu_time_used_ms.max(f.cpu_time_used_ms);
            max.resident_memory_bytes = max.resident_memory_bytes.max(f.resident_memory_bytes);
            max.virtual_memory_bytes = max.virtual_memory_bytes.max(f.virtual_memory_bytes);
            n += 1;
        }

        if n == 0 {
            return (Self::default(), Self::default());
        }
        let n = n as f64;
        let avg = Self {
            cpu_time_used_ms: sum.cpu_time_used_ms / n,
            resident_memory_bytes: sum.resident_memory_bytes / n,
            virtual_memory_bytes: sum.virtual_memory_bytes / n,
        };
        (avg, max)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceStatsSummary {
    /// Number of retained samples
    pub samples: usize,
    pub current: Option<PerformanceSample>,
    pub average: PerformanceFigures,
    pub max: PerformanceFigures,
}

// ─── Combined ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub requests: RequestStatsSummary,
    pub errors: ErrorStatsSummary,
    pub performance: PerformanceStatsSummary,
    pub uptime_seconds: f64,
}

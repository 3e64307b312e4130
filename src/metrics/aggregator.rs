use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{error, warn};

use super::history::History;
use super::percentiles::PercentileSet;
use super::process::ProcessProbe;
use super::summary::{
    EndpointStats, ErrorStatsSummary, MetricsSummary, PerformanceFigures,
    PerformanceStatsSummary, RequestStatsSummary,
};
use super::{ErrorRecord, PerformanceSample, RequestRecord};
use crate::config::MetricsSettings;

// ─── Public types ────────────────────────────────────────────────

/// Thread-safe request/error/performance history.
/// The tracking middleware and the sampler write, monitoring handlers read.
///
/// Each history has its own lock, so request and error recording never
/// contend with each other.
pub struct MetricsAggregator {
    requests: Mutex<History<RequestRecord>>,
    errors: Mutex<History<ErrorRecord>>,
    performance: Mutex<History<PerformanceSample>>,
    probe: Mutex<ProcessProbe>,
    slow_request_threshold_ms: f64,
    recent_errors_limit: usize,
    started_at: Instant,
}

/// Running totals for one endpoint while building request stats.
#[derive(Default)]
struct EndpointAccumulator {
    count: usize,
    time_sum_ms: f64,
    errors: usize,
}

// ─── MetricsAggregator impl ──────────────────────────────────────

impl MetricsAggregator {
    pub fn new(settings: &MetricsSettings) -> Self {
        Self {
            requests: Mutex::new(History::new(settings.request_capacity)),
            errors: Mutex::new(History::new(settings.error_capacity)),
            performance: Mutex::new(History::new(settings.performance_capacity)),
            probe: Mutex::new(ProcessProbe::new()),
            slow_request_threshold_ms: settings.slow_request_threshold_ms,
            recent_errors_limit: settings.recent_errors_limit,
            started_at: Instant::now(),
        }
    }

    // ── Write side ──────────────────────────────────────────────

    /// Store a completed request, warning when it was slow.
    pub fn record_request(&self, record: RequestRecord) {
        if record.response_time_ms > self.slow_request_threshold_ms {
            warn!(
                method = %record.method,
                endpoint = %record.endpoint,
                response_time_ms = record.response_time_ms,
                "Slow request detected: {} {} took {:.0}ms",
                record.method,
                record.endpoint,
                record.response_time_ms,
            );
        }
        self.requests.lock().push(record);
    }

    /// Store a request-handling error and log it.
    pub fn record_error(&self, record: ErrorRecord) {
        error!(
            error_type = %record.error_type,
            method = %record.method,
            endpoint = %record.endpoint,
            "{} on {} {}: {}",
            record.error_type,
            record.method,
            record.endpoint,
            record.message,
        );
        self.errors.lock().push(record);
    }

    /// Sample the live process. Nothing is stored if the probe fails.
    pub fn record_performance(&self) {
        let sample = self.probe.lock().sample();
        match sample {
            Some(sample) => self.record_performance_sample(sample),
            None => warn!("Process resource usage unavailable; skipping performance sample"),
        }
    }

    pub fn record_performance_sample(&self, sample: PerformanceSample) {
        self.performance.lock().push(sample);
    }

    /// Wipe every history. Uptime keeps counting from construction.
    pub fn clear(&self) {
        self.requests.lock().clear();
        self.errors.lock().clear();
        self.performance.lock().clear();
    }

    // ── Read side ───────────────────────────────────────────────

    /// Summarise requests newer than `window`, or all retained ones.
    pub fn request_stats(&self, window: Option<Duration>) -> RequestStatsSummary {
        let cutoff = cutoff(window);
        let requests = self.requests.lock();

        let mut total = 0usize;
        let mut time_sum_ms = 0.0;
        let mut by_endpoint: HashMap<_, EndpointAccumulator> = HashMap::new();
        let mut by_status_code = HashMap::new();
        let mut times = Vec::new();

        for r in requests.iter().filter(|r| in_window(r.timestamp, cutoff)) {
            total += 1;
            time_sum_ms += r.response_time_ms;
            times.push(r.response_time_ms);
            *by_status_code.entry(r.status_code).or_insert(0) += 1;

            let acc = by_endpoint.entry(r.key()).or_default();
            acc.count += 1;
            acc.time_sum_ms += r.response_time_ms;
            if r.is_error() {
                acc.errors += 1;
            }
        }
        drop(requests);

        let by_endpoint = by_endpoint
            .into_iter()
            .map(|(key, acc)| {
                let stats = EndpointStats {
                    count: acc.count,
                    avg_response_time_ms: mean(acc.time_sum_ms, acc.count),
                    errors: acc.errors,
                };
                (key, stats)
            })
            .collect();

        RequestStatsSummary {
            total,
            by_endpoint,
            by_status_code,
            avg_response_time_ms: mean(time_sum_ms, total),
            response_time_percentiles: PercentileSet::from_millis(times),
        }
    }

    /// Summarise errors newer than `window`, or all retained ones.
    pub fn error_stats(&self, window: Option<Duration>) -> ErrorStatsSummary {
        let cutoff = cutoff(window);
        let errors = self.errors.lock();

        let mut by_type = HashMap::new();
        let mut by_endpoint = HashMap::new();
        let mut matched = Vec::new();

        for e in errors.iter().filter(|e| in_window(e.timestamp, cutoff)) {
            *by_type.entry(e.error_type.clone()).or_insert(0) += 1;
            *by_endpoint.entry(e.key()).or_insert(0) += 1;
            matched.push(e);
        }

        let total = matched.len();
        let skip = total.saturating_sub(self.recent_errors_limit);
        let recent = matched.into_iter().skip(skip).cloned().collect();

        ErrorStatsSummary {
            total,
            by_type,
            by_endpoint,
            recent,
        }
    }

    pub fn performance_stats(&self) -> PerformanceStatsSummary {
        let samples = self.performance.lock();
        let (average, max) = PerformanceFigures::mean_and_max(samples.iter());

        PerformanceStatsSummary {
            samples: samples.len(),
            current: samples.latest().copied(),
            average,
            max,
        }
    }

    /// Everything the monitoring dashboard polls for in one call.
    pub fn summary(&self, window: Option<Duration>) -> MetricsSummary {
        MetricsSummary {
            requests: self.request_stats(window),
            errors: self.error_stats(window),
            performance: self.performance_stats(),
            uptime_seconds: self.uptime().as_secs_f64(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new(&MetricsSettings::default())
    }
}

// ─── Helpers ─────────────────────────────────────────────────────

/// Oldest timestamp still inside `window`. `None` keeps everything,
/// including windows too large to subtract from now.
fn cutoff(window: Option<Duration>) -> Option<DateTime<Utc>> {
    let window = chrono::Duration::from_std(window?).ok()?;
    Utc::now().checked_sub_signed(window)
}

fn in_window(timestamp: DateTime<Utc>, cutoff: Option<DateTime<Utc>>) -> bool {
    cutoff.map_or(true, |c| timestamp >= c)
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

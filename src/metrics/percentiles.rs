use hdrhistogram::Histogram;
use serde::Serialize;

/// Auto-resizing HdrHistogram from 1 μs upward, 3 significant figures
const HIST_SIGFIG: u8 = 3;

/// Response-time percentile breakdown, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PercentileSet {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub p999: f64,
    pub count: u64,
}

impl PercentileSet {
    /// Build from millisecond durations. Values are bucketed at microsecond
    /// resolution; anything below 1 μs counts as 1 μs.
    /// Returns zeroed values if there are none.
    pub fn from_millis<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let Ok(mut hist) = Histogram::<u64>::new(HIST_SIGFIG) else {
            return Self::empty();
        };

        for ms in values {
            let us = (ms * 1000.0).round().max(1.0) as u64;
            if hist.record(us).is_err() {
                hist.saturating_record(us);
            }
        }

        if hist.len() == 0 {
            return Self::empty();
        }

        let ms = |us: u64| us as f64 / 1000.0;
        Self {
            min: ms(hist.min()),
            max: ms(hist.max()),
            mean: hist.mean() / 1000.0,
            p50: ms(hist.value_at_percentile(50.0)),
            p95: ms(hist.value_at_percentile(95.0)),
            p99: ms(hist.value_at_percentile(99.0)),
            p999: ms(hist.value_at_percentile(99.9)),
            count: hist.len(),
        }
    }

    /// All-zero placeholder used before any requests are recorded.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_data(&self) -> bool {
        self.count > 0
    }
}

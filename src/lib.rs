use std::sync::Arc;

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod sampler;
pub mod server;
pub mod telemetry;

use crate::config::Settings;
use crate::metrics::MetricsAggregator;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Central metrics engine. The tracking middleware pushes records,
    /// monitoring handlers read summaries.
    pub metrics: Arc<MetricsAggregator>,

    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            metrics: Arc::new(MetricsAggregator::new(&settings.metrics)),
            settings: Arc::new(settings),
        }
    }
}

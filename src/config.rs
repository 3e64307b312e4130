use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::error::SettingsError;

// ─── Configuration sources ───────────────────────────────────────

/// File looked up in the working directory when no explicit path is given.
const DEFAULT_CONFIG_FILE: &str = "portal-metrics.toml";

/// Env var that overrides the config file location.
const CONFIG_PATH_ENV: &str = "PORTAL_METRICS_CONFIG";

/// Prefix for per-key overrides, e.g. `PORTAL_METRICS_METRICS__REQUEST_CAPACITY`.
const ENV_PREFIX: &str = "PORTAL_METRICS";

// ─── Settings tree ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub metrics: MetricsSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

/// Retention limits and thresholds for the aggregator and sampler.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Max request records kept (oldest evicted first)
    pub request_capacity: usize,
    /// Max error records kept
    pub error_capacity: usize,
    /// Max performance samples kept
    pub performance_capacity: usize,
    /// Requests slower than this emit a warning
    pub slow_request_threshold_ms: f64,
    /// Size of the `recent` list in error stats
    pub recent_errors_limit: usize,
    /// Period of the background performance sampler
    pub sample_interval_secs: u64,
    /// Whether `DELETE /api/monitoring/metrics` may clear the histories
    pub allow_reset: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub json: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
        }
    }
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            request_capacity: 1000,
            error_capacity: 500,
            performance_capacity: 100,
            slow_request_threshold_ms: 1000.0,
            recent_errors_limit: 50,
            sample_interval_secs: 30,
            allow_reset: false,
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
        }
    }
}

// ─── Loading ─────────────────────────────────────────────────────

impl Settings {
    /// Layer defaults, the optional TOML file and `PORTAL_METRICS_*` env vars.
    ///
    /// An explicitly named file (argument or `PORTAL_METRICS_CONFIG`) must
    /// exist; the default `portal-metrics.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let file = match &explicit {
            Some(p) => File::from(p.as_path()).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let builder = Config::builder().add_source(file).add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Self::build(builder)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, SettingsError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let m = &self.metrics;
        let positive = [
            ("metrics.request_capacity", m.request_capacity as u64),
            ("metrics.error_capacity", m.error_capacity as u64),
            ("metrics.performance_capacity", m.performance_capacity as u64),
            ("metrics.recent_errors_limit", m.recent_errors_limit as u64),
            ("metrics.sample_interval_secs", m.sample_interval_secs),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(SettingsError::Invalid(format!("{key} must be greater than 0")));
            }
        }
        if m.slow_request_threshold_ms.is_nan() || m.slow_request_threshold_ms < 0.0 {
            return Err(SettingsError::Invalid(
                "metrics.slow_request_threshold_ms must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the site monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Sites to probe, in display order.
    pub sites: Vec<SiteConfig>,

    /// Probe timing and concurrency.
    pub polling: PollingConfig,

    /// Global snapshot aggregation and persistence.
    pub aggregation: AggregationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// One monitored site.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    /// Display name; defaults to the URL host.
    #[serde(default)]
    pub name: Option<String>,

    /// URL probed with GET (http or https).
    pub url: String,
}

impl SiteConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            name: None,
            url: url.into(),
        }
    }

    pub fn named(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            url: url.into(),
        }
    }

    /// Effective display name.
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| {
                u.host_str().map(|host| match u.port() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                })
            })
            .unwrap_or_else(|| self.url.clone())
    }
}

/// Probe timing and concurrency.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Time between probes of one site in milliseconds.
    pub interval_ms: u64,

    /// Probe timeout in milliseconds.
    pub timeout_ms: u64,

    /// Maximum probes in flight across all sites.
    pub max_concurrency: usize,

    /// Samples kept per site.
    pub history_capacity: usize,
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            timeout_ms: 5_000,
            max_concurrency: 8,
            history_capacity: 600,
        }
    }
}

/// Global snapshot aggregation and persistence.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Time between snapshots in seconds.
    pub interval_secs: u64,

    /// Availability window of each snapshot, in seconds.
    pub window_secs: u64,

    /// Longer rolling windows reported per site alongside the availability
    /// window (latency and response codes).
    pub windows: Vec<WindowConfig>,

    /// Append-only snapshot log (JSON lines).
    pub log_path: String,

    /// Directory for raw per-site sample dumps; disabled when unset.
    pub raw_samples_dir: Option<String>,

    /// Time between raw sample dumps in seconds.
    pub raw_interval_secs: u64,
}

impl AggregationConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn spans(&self) -> Vec<Duration> {
        self.windows.iter().map(WindowConfig::span).collect()
    }

    pub fn raw_interval(&self) -> Duration {
        Duration::from_secs(self.raw_interval_secs)
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            window_secs: 120,
            windows: vec![WindowConfig::new(600), WindowConfig::new(3_600)],
            log_path: "logs/snapshots.jsonl".to_string(),
            raw_samples_dir: None,
            raw_interval_secs: 10,
        }
    }
}

/// One rolling statistics window.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct WindowConfig {
    /// How far back the window reaches, in seconds.
    pub span_secs: u64,
}

impl WindowConfig {
    pub fn new(span_secs: u64) -> Self {
        Self { span_secs }
    }

    pub fn span(&self) -> Duration {
        Duration::from_secs(self.span_secs)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

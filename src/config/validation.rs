//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals, timeout, capacity, concurrency > 0)
//! - Check site URLs and name uniqueness
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MonitorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::MonitorConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no sites configured")]
    NoSites,

    #[error("{field} must be positive")]
    NotPositive { field: &'static str },

    #[error("site #{index}: invalid URL '{url}': {reason}")]
    InvalidUrl { index: usize, url: String, reason: String },

    #[error("duplicate site name '{0}'")]
    DuplicateName(String),

    #[error("invalid log level '{0}'")]
    InvalidLogLevel(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),

    #[error("aggregation log path must not be empty")]
    EmptyLogPath,
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Check a log level name, case-insensitively.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    if LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidLogLevel(level.to_string()))
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.sites.is_empty() {
        errors.push(ValidationError::NoSites);
    }

    let mut names = HashSet::new();
    for (index, site) in config.sites.iter().enumerate() {
        match url::Url::parse(&site.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::InvalidUrl {
                index,
                url: site.url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            }),
            Err(e) => errors.push(ValidationError::InvalidUrl {
                index,
                url: site.url.clone(),
                reason: e.to_string(),
            }),
        }

        let name = site.display_name();
        if !names.insert(name.clone()) {
            errors.push(ValidationError::DuplicateName(name));
        }
    }

    let positive = [
        ("polling.interval_ms", config.polling.interval_ms > 0),
        ("polling.timeout_ms", config.polling.timeout_ms > 0),
        ("polling.max_concurrency", config.polling.max_concurrency > 0),
        ("polling.history_capacity", config.polling.history_capacity > 0),
        ("aggregation.interval_secs", config.aggregation.interval_secs > 0),
        ("aggregation.window_secs", config.aggregation.window_secs > 0),
        ("aggregation.raw_interval_secs", config.aggregation.raw_interval_secs > 0),
    ];
    for (field, ok) in positive {
        if !ok {
            errors.push(ValidationError::NotPositive { field });
        }
    }
    if config.aggregation.windows.iter().any(|w| w.span_secs == 0) {
        errors.push(ValidationError::NotPositive {
            field: "aggregation.windows.span_secs",
        });
    }

    if config.aggregation.log_path.trim().is_empty() {
        errors.push(ValidationError::EmptyLogPath);
    }

    if let Err(e) = validate_log_level(&config.observability.log_level) {
        errors.push(e);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! Timestamped probe samples.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::history::Keyed;
use crate::probe::ProbeOutcome;

/// The recorded result of one probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeStatus {
    Up {
        latency_ms: f64,
        code: u16,
    },
    Down {
        latency_ms: f64,
        code: Option<u16>,
        reason: String,
    },
}

/// One immutable probe record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// When the probe started.
    pub timestamp: DateTime<Utc>,
    pub status: ProbeStatus,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, status: ProbeStatus) -> Self {
        Self { timestamp, status }
    }

    pub fn up(timestamp: DateTime<Utc>, latency_ms: f64, code: u16) -> Self {
        Self::new(timestamp, ProbeStatus::Up { latency_ms, code })
    }

    pub fn down(timestamp: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self::new(
            timestamp,
            ProbeStatus::Down {
                latency_ms: 0.0,
                code: None,
                reason: reason.into(),
            },
        )
    }

    /// Build a sample from a probe outcome.
    pub fn from_outcome(timestamp: DateTime<Utc>, outcome: &ProbeOutcome) -> Self {
        let latency_ms = outcome.latency.as_secs_f64() * 1_000.0;
        let status = match (outcome.success, outcome.code) {
            (true, Some(code)) => ProbeStatus::Up { latency_ms, code },
            // Success without a response code is not produced by the HTTP
            // probe; scripted probes may still report it.
            (true, None) => ProbeStatus::Up { latency_ms, code: 0 },
            (false, code) => ProbeStatus::Down {
                latency_ms,
                code,
                reason: outcome.detail.clone(),
            },
        };
        Self { timestamp, status }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, ProbeStatus::Up { .. })
    }

    pub fn latency_ms(&self) -> f64 {
        match self.status {
            ProbeStatus::Up { latency_ms, .. } | ProbeStatus::Down { latency_ms, .. } => latency_ms,
        }
    }

    pub fn code(&self) -> Option<u16> {
        match self.status {
            ProbeStatus::Up { code, .. } => Some(code),
            ProbeStatus::Down { code, .. } => code,
        }
    }
}

impl Keyed for Sample {
    type Key = DateTime<Utc>;

    fn key(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_from_outcome() {
        let now = Utc::now();
        let up = Sample::from_outcome(now, &ProbeOutcome::up(Duration::from_millis(120), 200));
        assert!(up.is_success());
        assert_eq!(up.code(), Some(200));
        assert!((up.latency_ms() - 120.0).abs() < 1e-6);

        let down = Sample::from_outcome(now, &ProbeOutcome::timed_out(Duration::from_secs(1)));
        assert!(!down.is_success());
        assert_eq!(down.code(), None);
        assert!(matches!(down.status, ProbeStatus::Down { ref reason, .. } if reason.contains("timed out")));
    }

    #[test]
    fn test_serialized_shape() {
        let now = Utc::now();
        let json = serde_json::to_value(Sample::up(now, 12.5, 204)).unwrap();
        assert_eq!(json["status"]["kind"], "up");
        assert_eq!(json["status"]["code"], 204);
    }
}

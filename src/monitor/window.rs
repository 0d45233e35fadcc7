//! Statistics over a window of samples.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::probe::Sample;

/// Key used in code counts for probes that got no HTTP response.
pub const NO_RESPONSE: &str = "no_response";

/// Latency distribution of successful probes, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub min_ms: f64,
    pub mean_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub max_ms: f64,
}

impl LatencySummary {
    /// Summarize a set of latencies. Returns `None` when empty.
    pub fn from_latencies(mut latencies: Vec<f64>) -> Option<Self> {
        if latencies.is_empty() {
            return None;
        }
        latencies.sort_by(|a, b| a.total_cmp(b));

        let count = latencies.len();
        let sum: f64 = latencies.iter().sum();
        Some(Self {
            min_ms: latencies[0],
            mean_ms: sum / count as f64,
            p50_ms: nearest_rank(&latencies, 0.50),
            p95_ms: nearest_rank(&latencies, 0.95),
            max_ms: latencies[count - 1],
        })
    }
}

/// Nearest-rank percentile over sorted, non-empty input.
fn nearest_rank(sorted: &[f64], quantile: f64) -> f64 {
    let rank = (quantile * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Availability and latency figures for one site over one window.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowStats {
    pub samples: usize,
    pub successes: usize,
    pub failures: usize,
    /// Share of successful probes, `None` when the window is empty.
    pub availability_ratio: Option<f64>,
    pub latency: Option<LatencySummary>,
    /// Response code counts; probes without a response count under `no_response`.
    pub codes: BTreeMap<String, u64>,
}

impl WindowStats {
    pub fn from_samples(samples: &[Sample]) -> Self {
        let mut stats = WindowStats {
            samples: samples.len(),
            ..Default::default()
        };
        let mut latencies = Vec::with_capacity(samples.len());

        for sample in samples {
            if sample.is_success() {
                stats.successes += 1;
                latencies.push(sample.latency_ms());
            } else {
                stats.failures += 1;
            }
            let key = match sample.code() {
                Some(code) => code.to_string(),
                None => NO_RESPONSE.to_string(),
            };
            *stats.codes.entry(key).or_insert(0) += 1;
        }

        if stats.samples > 0 {
            stats.availability_ratio = Some(stats.successes as f64 / stats.samples as f64);
        }
        stats.latency = LatencySummary::from_latencies(latencies);
        stats
    }
}

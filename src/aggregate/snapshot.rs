//! Global snapshot aggregation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::monitor::{Availability, LatencySummary, SiteMonitor, WindowStats};
use crate::probe::Sample;

/// Per-site part of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSummary {
    pub name: String,
    pub url: String,
    pub availability: Availability,
    pub unavailable_since: Option<DateTime<Utc>>,
    pub recovered_at: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
    /// Statistics over the availability window.
    pub window: WindowStats,
    /// Statistics over each longer rolling window.
    pub windows: Vec<SpanStats>,
}

/// Statistics of one site over one rolling window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanStats {
    pub span_secs: u64,
    pub stats: WindowStats,
}

/// Aggregate view of every site at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSnapshot {
    pub timestamp: DateTime<Utc>,
    pub window_secs: u64,
    pub sites: usize,
    pub available: usize,
    pub unavailable: usize,
    pub unknown: usize,
    /// Samples inside the window across all sites.
    pub samples: usize,
    pub failures: usize,
    /// Latency of successful probes across all sites.
    pub latency: Option<LatencySummary>,
    pub per_site: Vec<SiteSummary>,
}

impl GlobalSnapshot {
    /// Read every site and summarize the samples within `window` before `now`,
    /// plus per-site statistics for each of `spans`.
    pub fn collect(
        monitors: &[Arc<SiteMonitor>],
        now: DateTime<Utc>,
        window: Duration,
        spans: &[Duration],
    ) -> Self {
        let from = window_start(now, window);

        let mut snapshot = GlobalSnapshot {
            timestamp: now,
            window_secs: window.as_secs(),
            sites: monitors.len(),
            available: 0,
            unavailable: 0,
            unknown: 0,
            samples: 0,
            failures: 0,
            latency: None,
            per_site: Vec::with_capacity(monitors.len()),
        };
        let mut latencies = Vec::new();

        for monitor in monitors {
            let state = monitor.get_state();
            match state.availability {
                Availability::Available => snapshot.available += 1,
                Availability::Unavailable => snapshot.unavailable += 1,
                Availability::Unknown => snapshot.unknown += 1,
            }

            let samples = samples_between(monitor, from, now);
            latencies.extend(samples.iter().filter(|s| s.is_success()).map(|s| s.latency_ms()));

            let window = WindowStats::from_samples(&samples);
            snapshot.samples += window.samples;
            snapshot.failures += window.failures;

            let windows = spans
                .iter()
                .map(|span| SpanStats {
                    span_secs: span.as_secs(),
                    stats: WindowStats::from_samples(&samples_between(monitor, window_start(now, *span), now)),
                })
                .collect();

            snapshot.per_site.push(SiteSummary {
                name: monitor.name().to_string(),
                url: state.url.clone(),
                availability: state.availability,
                unavailable_since: state.unavailable_since,
                recovered_at: state.recovered_at,
                last_updated: state.last_updated,
                window,
                windows,
            });
        }

        snapshot.latency = LatencySummary::from_latencies(latencies);
        snapshot
    }
}

/// `now - span`, saturating at the earliest representable instant.
fn window_start(now: DateTime<Utc>, span: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(span)
        .ok()
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn samples_between(monitor: &SiteMonitor, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Sample> {
    match monitor.get_metrics_between(from, to) {
        Ok(samples) => samples,
        Err(e) => {
            tracing::warn!(site = %monitor.name(), error = %e, "Skipping site window");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::Sample;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_collect_counts_and_window() {
        let up = Arc::new(SiteMonitor::new("up", "http://up.test/", 100).unwrap());
        let down = Arc::new(SiteMonitor::new("down", "http://down.test/", 100).unwrap());
        let idle = Arc::new(SiteMonitor::new("idle", "http://idle.test/", 100).unwrap());

        // Outside the window.
        up.update_metrics(Sample::up(at(0), 1_000.0, 200));
        for i in 100..110 {
            up.update_metrics(Sample::up(at(i), (i - 99) as f64, 200));
            down.update_metrics(Sample::down(at(i), "refused"));
        }

        let snapshot = GlobalSnapshot::collect(&[up, down, idle], at(110), Duration::from_secs(60), &[]);
        assert_eq!(snapshot.sites, 3);
        assert_eq!((snapshot.available, snapshot.unavailable, snapshot.unknown), (1, 1, 1));
        assert_eq!(snapshot.samples, 20);
        assert_eq!(snapshot.failures, 10);

        let latency = snapshot.latency.unwrap();
        assert_eq!(latency.min_ms, 1.0);
        assert_eq!(latency.max_ms, 10.0);

        assert_eq!(snapshot.per_site[0].window.availability_ratio, Some(1.0));
        assert_eq!(snapshot.per_site[1].window.availability_ratio, Some(0.0));
        assert_eq!(snapshot.per_site[1].unavailable_since, Some(at(100)));
        assert_eq!(snapshot.per_site[2].window.samples, 0);
    }

    #[test]
    fn test_huge_window_does_not_overflow() {
        let site = Arc::new(SiteMonitor::new("a", "http://a.test/", 10).unwrap());
        site.update_metrics(Sample::up(at(0), 1.0, 200));
        let snapshot = GlobalSnapshot::collect(&[site], at(1), Duration::MAX, &[Duration::MAX]);
        assert_eq!(snapshot.samples, 1);
        assert_eq!(snapshot.per_site[0].windows[0].stats.samples, 1);
    }

    #[test]
    fn test_rolling_windows_per_site() {
        let site = Arc::new(SiteMonitor::new("a", "http://a.test/", 1_000).unwrap());
        // One sample per minute over the last hour; the first half failed with 503.
        for minute in 0..60 {
            let ts = at(minute * 60);
            if minute < 30 {
                let outcome = crate::probe::ProbeOutcome::down(std::time::Duration::from_millis(5), Some(503), "HTTP 503");
                site.update_metrics(Sample::from_outcome(ts, &outcome));
            } else {
                site.update_metrics(Sample::up(ts, minute as f64, 200));
            }
        }

        let spans = [Duration::from_secs(600), Duration::from_secs(3_600)];
        let snapshot = GlobalSnapshot::collect(&[site], at(59 * 60), Duration::from_secs(120), &spans);
        let summary = &snapshot.per_site[0];

        assert_eq!(summary.window.samples, 3);
        assert_eq!(summary.windows.len(), 2);

        let ten_minutes = &summary.windows[0];
        assert_eq!(ten_minutes.span_secs, 600);
        assert_eq!(ten_minutes.stats.samples, 11);
        assert_eq!(ten_minutes.stats.availability_ratio, Some(1.0));
        assert_eq!(ten_minutes.stats.latency.as_ref().unwrap().max_ms, 59.0);

        let hour = &summary.windows[1];
        assert_eq!(hour.span_secs, 3_600);
        assert_eq!(hour.stats.samples, 60);
        assert_eq!(hour.stats.codes.get("503"), Some(&30));
        assert_eq!(hour.stats.codes.get("200"), Some(&30));
    }
}

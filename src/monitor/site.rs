//! Site monitor: history plus availability state for one site.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

use crate::history::{HistoryBuffer, HistoryError};
use crate::monitor::state::{AvailabilityEvent, SiteState};
use crate::monitor::window::WindowStats;
use crate::observability::metrics;
use crate::probe::Sample;

/// Error type for site construction.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported scheme '{scheme}' in '{url}', expected http or https")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("site name must not be empty")]
    EmptyName,
}

/// Monitors one site.
///
/// `update_metrics` must only be called from the site's own poll loop. Any
/// number of readers may call the `get_*` methods concurrently.
#[derive(Debug)]
pub struct SiteMonitor {
    name: String,
    url: Url,
    state: ArcSwap<SiteState>,
    history: HistoryBuffer<Sample>,
}

impl SiteMonitor {
    /// Create a monitor for `url` keeping at most `history_capacity` samples.
    pub fn new(name: impl Into<String>, url: &str, history_capacity: usize) -> Result<Self, SiteError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SiteError::EmptyName);
        }
        let parsed = parse_site_url(url)?;

        Ok(Self {
            name,
            state: ArcSwap::from_pointee(SiteState::new(parsed.as_str(), Utc::now())),
            url: parsed,
            history: HistoryBuffer::new(history_capacity),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Record one probe sample and advance the state machine.
    ///
    /// Returns the transition event when the availability changed.
    pub fn update_metrics(&self, sample: Sample) -> Option<AvailabilityEvent> {
        let success = sample.is_success();
        let at = sample.timestamp;
        self.history.add(sample);

        let current = self.state.load_full();
        let (next, previous) = current.apply(success, at);
        let to = next.availability;
        self.state.store(Arc::new(next));

        let from = previous?;
        metrics::record_site_availability(&self.name, to);
        if success {
            tracing::info!(site = %self.name, url = %self.url, from = %from, "Site available");
        } else {
            tracing::warn!(site = %self.name, url = %self.url, from = %from, "Site unavailable");
        }

        Some(AvailabilityEvent {
            timestamp: at,
            site: self.name.clone(),
            url: self.url.to_string(),
            from,
            to,
        })
    }

    /// Current state snapshot. Never blocks the writer.
    pub fn get_state(&self) -> Arc<SiteState> {
        self.state.load_full()
    }

    /// All retained samples, oldest first.
    pub fn get_metrics(&self) -> Vec<Sample> {
        self.history.to_vec()
    }

    /// State and full history read together. The history is read second and
    /// may already hold a sample the state does not reflect yet.
    pub fn read_metrics(&self) -> (Arc<SiteState>, Vec<Sample>) {
        (self.get_state(), self.get_metrics())
    }

    /// Retained samples with a timestamp in `[from, to]`.
    pub fn get_metrics_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Sample>, HistoryError> {
        self.history.range(from, to)
    }

    /// Window statistics over samples with a timestamp in `[from, to]`.
    pub fn window_stats(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<WindowStats, HistoryError> {
        let samples = self.get_metrics_between(from, to)?;
        Ok(WindowStats::from_samples(&samples))
    }

    pub fn history(&self) -> &HistoryBuffer<Sample> {
        &self.history
    }
}

fn parse_site_url(url: &str) -> Result<Url, SiteError> {
    let parsed = Url::parse(url).map_err(|source| SiteError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(SiteError::UnsupportedScheme {
            url: url.to_string(),
            scheme: scheme.to_string(),
        }),
    }
}

//! Raw per-site sample dumps.
//!
//! # Responsibilities
//! - Periodically append each site's new samples to `<dir>/<site>_raw.jsonl`
//! - Track a per-site sequence cursor so every retained sample is written once,
//!   whatever its timestamp
//! - Dump what is left and close the files on stop

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::aggregate::global::GlobalMonitorError;
use crate::aggregate::log::JsonLinesLog;
use crate::lifecycle::{FirstTick, PeriodicHandle, PeriodicTask};
use crate::monitor::SiteMonitor;
use crate::observability::metrics;

struct SiteDump {
    monitor: Arc<SiteMonitor>,
    file: JsonLinesLog,
    /// Sequence number of the last sample written.
    cursor: Mutex<u64>,
}

impl SiteDump {
    /// Append samples added since the cursor. Returns how many were written.
    fn dump(&self) -> usize {
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        let (newest, fresh) = self.monitor.history().since(*cursor);
        let first = newest - fresh.len() as u64;

        let mut written = 0;
        for sample in &fresh {
            if let Err(e) = self.file.append(sample) {
                metrics::record_persist_error(e.kind());
                tracing::error!(site = %self.monitor.name(), error = %e, "Failed to write raw sample");
                break;
            }
            written += 1;
        }
        *cursor = first + written as u64;
        written
    }
}

/// Writes every probe sample to per-site files.
pub struct RawSampleWriter {
    sites: Arc<Vec<SiteDump>>,
    interval: Duration,
    running: Mutex<Option<PeriodicHandle>>,
}

impl RawSampleWriter {
    /// Open one file per site under `dir`.
    pub fn new(
        monitors: &[Arc<SiteMonitor>],
        dir: impl AsRef<Path>,
        interval: Duration,
    ) -> Result<Self, GlobalMonitorError> {
        if interval.is_zero() {
            return Err(GlobalMonitorError::InvalidSettings("raw interval must be positive".into()));
        }

        let mut sites = Vec::with_capacity(monitors.len());
        let mut seen: HashMap<String, usize> = HashMap::new();
        for monitor in monitors {
            let mut stem = file_stem(monitor.name());
            let count = seen.entry(stem.clone()).or_insert(0);
            *count += 1;
            if *count > 1 {
                stem = format!("{}_{}", stem, count);
            }
            let file = JsonLinesLog::open(dir.as_ref().join(format!("{}_raw.jsonl", stem)))?;
            sites.push(SiteDump {
                monitor: monitor.clone(),
                file,
                cursor: Mutex::new(0),
            });
        }

        Ok(Self {
            sites: Arc::new(sites),
            interval,
            running: Mutex::new(None),
        })
    }

    /// Start dumping every interval. Must be called within a tokio runtime.
    pub fn start(&self) -> Result<(), GlobalMonitorError> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.is_some() {
            return Err(GlobalMonitorError::AlreadyRunning);
        }

        let sites = self.sites.clone();
        let handle = PeriodicTask::new("raw-writer", self.interval)
            .first_tick(FirstTick::AfterInterval)
            .start(move || {
                let sites = sites.clone();
                async move {
                    let written: usize = sites.iter().map(SiteDump::dump).sum();
                    tracing::trace!(written, "Raw samples dumped");
                }
            });
        *running = Some(handle);
        Ok(())
    }

    /// Stop the loop, write any pending samples and close every file.
    pub async fn stop(&self) {
        let handle = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.stop().await;
        }

        for site in self.sites.iter() {
            if !site.file.is_closed() {
                site.dump();
            }
            if let Err(e) = site.file.close() {
                tracing::error!(site = %site.monitor.name(), error = %e, "Failed to close raw sample file");
            }
        }
    }

    /// Write pending samples now, outside the periodic cadence.
    pub fn flush(&self) -> usize {
        self.sites.iter().map(SiteDump::dump).sum()
    }
}

/// Turn a site name into a safe file stem.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect()
}

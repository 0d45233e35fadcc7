//! Global monitor: periodic aggregation with write-through event logging.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;

use crate::aggregate::log::{JsonLinesLog, LogRecord, PersistError};
use crate::aggregate::snapshot::GlobalSnapshot;
use crate::lifecycle::{FirstTick, PeriodicHandle, PeriodicTask};
use crate::monitor::{AvailabilityEvent, SiteMonitor};
use crate::observability::metrics;
use crate::scheduler::EventSink;

/// Error type for global monitor construction and control.
#[derive(Debug, Error)]
pub enum GlobalMonitorError {
    #[error("no sites to aggregate")]
    NoSites,

    #[error("invalid global monitor settings: {0}")]
    InvalidSettings(String),

    #[error("global monitor is already running")]
    AlreadyRunning,

    #[error("global monitor has been stopped")]
    Stopped,

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Aggregation cadence and windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalSettings {
    /// Time between two snapshots.
    pub interval: Duration,
    /// How far back availability figures look.
    pub window: Duration,
    /// Longer rolling windows reported per site.
    pub spans: Vec<Duration>,
}

enum RunState {
    Idle,
    Running(PeriodicHandle),
    Stopped,
}

/// Periodically snapshots every site and appends the result to a log.
pub struct GlobalMonitor {
    monitors: Arc<Vec<Arc<SiteMonitor>>>,
    settings: GlobalSettings,
    log: Arc<JsonLinesLog>,
    state: Mutex<RunState>,
}

impl GlobalMonitor {
    /// Create the monitor and open its log. Fails fast on bad settings or an
    /// unwritable log path.
    pub fn new(
        monitors: Vec<Arc<SiteMonitor>>,
        settings: GlobalSettings,
        log_path: impl AsRef<Path>,
    ) -> Result<Self, GlobalMonitorError> {
        if monitors.is_empty() {
            return Err(GlobalMonitorError::NoSites);
        }
        if settings.interval.is_zero() {
            return Err(GlobalMonitorError::InvalidSettings("interval must be positive".into()));
        }
        if settings.window.is_zero() || settings.spans.iter().any(Duration::is_zero) {
            return Err(GlobalMonitorError::InvalidSettings("windows must be positive".into()));
        }

        let log = JsonLinesLog::open(log_path)?;
        tracing::info!(path = %log.path().display(), "Snapshot log opened");

        Ok(Self {
            monitors: Arc::new(monitors),
            settings,
            log: Arc::new(log),
            state: Mutex::new(RunState::Idle),
        })
    }

    pub fn settings(&self) -> &GlobalSettings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        matches!(
            *self.state.lock().unwrap_or_else(PoisonError::into_inner),
            RunState::Running(_)
        )
    }

    /// Start the aggregation loop. The first snapshot is taken one interval
    /// after start. Must be called within a tokio runtime.
    pub fn start(&self) -> Result<(), GlobalMonitorError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match *state {
            RunState::Running(_) => return Err(GlobalMonitorError::AlreadyRunning),
            RunState::Stopped => return Err(GlobalMonitorError::Stopped),
            RunState::Idle => {}
        }

        let monitors = self.monitors.clone();
        let log = self.log.clone();
        let window = self.settings.window;
        let spans = Arc::new(self.settings.spans.clone());
        let handle = PeriodicTask::new("global-monitor", self.settings.interval)
            .first_tick(FirstTick::AfterInterval)
            .start(move || {
                let monitors = monitors.clone();
                let log = log.clone();
                let spans = spans.clone();
                async move {
                    persist_snapshot(&monitors, &log, window, &spans);
                }
            });

        tracing::info!(
            sites = self.monitors.len(),
            interval_secs = self.settings.interval.as_secs(),
            window_secs = self.settings.window.as_secs(),
            "Global monitor started"
        );
        *state = RunState::Running(handle);
        Ok(())
    }

    /// Stop the loop, then flush and close the log.
    ///
    /// No record reaches the log after this returns. Stopping twice is a no-op.
    pub async fn stop(&self) -> Result<(), GlobalMonitorError> {
        let previous = std::mem::replace(
            &mut *self.state.lock().unwrap_or_else(PoisonError::into_inner),
            RunState::Stopped,
        );

        match previous {
            RunState::Running(handle) => handle.stop().await,
            RunState::Idle => {}
            RunState::Stopped => return Ok(()),
        }

        self.log.close()?;
        tracing::info!("Global monitor stopped");
        Ok(())
    }

    /// Build a snapshot of every site now, without persisting it.
    pub fn snapshot(&self) -> GlobalSnapshot {
        GlobalSnapshot::collect(&self.monitors, Utc::now(), self.settings.window, &self.settings.spans)
    }

    /// Write one availability event through to the log immediately.
    pub fn log(&self, event: &AvailabilityEvent) -> Result<(), PersistError> {
        self.log.append(&LogRecord::Event(event.clone()))
    }
}

impl EventSink for GlobalMonitor {
    fn record(&self, event: &AvailabilityEvent) {
        if let Err(e) = self.log(event) {
            metrics::record_persist_error(e.kind());
            tracing::error!(site = %event.site, error = %e, "Failed to log availability event");
        }
    }
}

fn persist_snapshot(monitors: &[Arc<SiteMonitor>], log: &JsonLinesLog, window: Duration, spans: &[Duration]) {
    let snapshot = GlobalSnapshot::collect(monitors, Utc::now(), window, spans);
    let (available, unavailable, samples) = (snapshot.available, snapshot.unavailable, snapshot.samples);

    match log.append(&LogRecord::Snapshot(snapshot)) {
        Ok(()) => {
            metrics::record_snapshot_written();
            tracing::debug!(available, unavailable, samples, "Snapshot persisted");
        }
        Err(e) => {
            metrics::record_persist_error(e.kind());
            tracing::error!(path = %log.path().display(), error = %e, "Failed to persist snapshot");
        }
    }
}

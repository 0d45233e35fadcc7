//! Request scheduler: one poll loop per site over a shared permit pool.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::lifecycle::{PeriodicTask, Shutdown};
use crate::monitor::SiteMonitor;
use crate::probe::Probe;
use crate::scheduler::poll::{poll_once, PollContext};
use crate::scheduler::EventSink;

/// Error type for scheduler construction and control.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("no sites to schedule")]
    NoSites,

    #[error("invalid scheduler settings: {0}")]
    InvalidSettings(String),

    #[error("scheduler is already running")]
    AlreadyRunning,
}

/// Timing and concurrency settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Time between the starts of two consecutive probes of one site.
    pub interval: Duration,
    /// Deadline of a single probe.
    pub timeout: Duration,
    /// Maximum number of probes in flight across all sites.
    pub max_concurrency: usize,
}

impl SchedulerSettings {
    fn validate(&self) -> Result<(), SchedulerError> {
        if self.interval.is_zero() {
            return Err(SchedulerError::InvalidSettings("interval must be positive".into()));
        }
        if self.timeout.is_zero() {
            return Err(SchedulerError::InvalidSettings("timeout must be positive".into()));
        }
        if self.max_concurrency == 0 {
            return Err(SchedulerError::InvalidSettings("max_concurrency must be positive".into()));
        }
        Ok(())
    }
}

struct Running {
    shutdown: Shutdown,
    loops: Vec<JoinHandle<()>>,
}

/// Drives one polling loop per site.
pub struct RequestScheduler<P: Probe> {
    monitors: Vec<Arc<SiteMonitor>>,
    settings: SchedulerSettings,
    context: Arc<PollContext<P>>,
    running: Mutex<Option<Running>>,
}

impl<P: Probe> RequestScheduler<P> {
    /// Create a scheduler. Fails on an empty site list or non-positive settings.
    pub fn new(
        monitors: Vec<Arc<SiteMonitor>>,
        settings: SchedulerSettings,
        probe: P,
    ) -> Result<Self, SchedulerError> {
        if monitors.is_empty() {
            return Err(SchedulerError::NoSites);
        }
        settings.validate()?;

        let context = PollContext {
            probe: Arc::new(probe),
            permits: Arc::new(Semaphore::new(settings.max_concurrency)),
            timeout: settings.timeout,
            sink: OnceLock::new(),
        };

        Ok(Self {
            monitors,
            settings,
            context: Arc::new(context),
            running: Mutex::new(None),
        })
    }

    /// Forward availability transitions to `sink`, including from loops
    /// already running. Only the first sink is kept.
    pub fn with_event_sink(self, sink: Arc<dyn EventSink>) -> Self {
        if self.context.sink.set(sink).is_err() {
            tracing::warn!("Event sink already installed, ignoring the new one");
        }
        self
    }

    pub fn settings(&self) -> SchedulerSettings {
        self.settings
    }

    pub fn monitors(&self) -> &[Arc<SiteMonitor>] {
        &self.monitors
    }

    /// Permits currently free in the shared pool.
    pub fn available_permits(&self) -> usize {
        self.context.permits.available_permits()
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Spawn one poll loop per site. Must be called within a tokio runtime.
    pub fn start(&self) -> Result<(), SchedulerError> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let shutdown = Shutdown::new();
        let loops = self
            .monitors
            .iter()
            .map(|monitor| {
                let context = self.context.clone();
                let monitor = monitor.clone();
                let signal = shutdown.subscribe();
                PeriodicTask::new(format!("poll:{}", monitor.name()), self.settings.interval).spawn(
                    shutdown.subscribe(),
                    move || {
                        let context = context.clone();
                        let monitor = monitor.clone();
                        let mut signal = signal.clone();
                        async move { poll_once(&context, &monitor, &mut signal).await }
                    },
                )
            })
            .collect();

        tracing::info!(
            sites = self.monitors.len(),
            interval_ms = self.settings.interval.as_millis() as u64,
            timeout_ms = self.settings.timeout.as_millis() as u64,
            max_concurrency = self.settings.max_concurrency,
            "Request scheduler started"
        );

        *running = Some(Running { shutdown, loops });
        Ok(())
    }

    /// Stop every poll loop and wait for them to exit.
    ///
    /// Once this returns, no site receives another `update_metrics` call.
    /// Calling it while stopped is a no-op.
    pub async fn stop(&self) {
        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(Running { shutdown, loops }) = running else {
            tracing::debug!("Request scheduler not running");
            return;
        };

        tracing::info!("Request scheduler stopping");
        shutdown.trigger();
        for handle in loops {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Poll loop terminated abnormally");
            }
        }
        tracing::info!("Request scheduler stopped");
    }
}

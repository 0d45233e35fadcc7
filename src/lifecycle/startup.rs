//! Startup orchestration.
//!
//! # Responsibilities
//! - Build every subsystem from a validated configuration
//! - Start aggregation before polling so no transition goes unlogged
//! - Stop in reverse order: polling, raw dumps, then aggregation
//!
//! # Design Decisions
//! - Fail fast: any construction error is fatal and nothing is started
//! - Subsystems initialize in order, not concurrently

use std::sync::Arc;

use thiserror::Error;

use crate::aggregate::{GlobalMonitor, GlobalMonitorError, GlobalSettings, RawSampleWriter};
use crate::config::{validate_config, ConfigError, MonitorConfig};
use crate::monitor::{SiteError, SiteMonitor};
use crate::probe::{HttpProbe, Probe};
use crate::scheduler::{RequestScheduler, SchedulerError, SchedulerSettings};

/// Error type for building or starting the monitor.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid site: {0}")]
    Site(#[from] SiteError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Global(#[from] GlobalMonitorError),
}

/// A fully wired monitor: site monitors, scheduler, global monitor and the
/// optional raw sample writer.
pub struct Monitoring<P: Probe = HttpProbe> {
    monitors: Vec<Arc<SiteMonitor>>,
    scheduler: RequestScheduler<P>,
    global: Arc<GlobalMonitor>,
    raw: Option<RawSampleWriter>,
}

impl Monitoring<HttpProbe> {
    /// Build with the HTTP probe.
    pub fn build(config: &MonitorConfig) -> Result<Self, StartupError> {
        Self::build_with_probe(config, HttpProbe::new()?)
    }
}

impl<P: Probe> Monitoring<P> {
    /// Build with any probe implementation. The configuration is validated
    /// first, whether or not it came through the loader.
    pub fn build_with_probe(config: &MonitorConfig, probe: P) -> Result<Self, StartupError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let monitors = config
            .sites
            .iter()
            .map(|site| {
                SiteMonitor::new(site.display_name(), &site.url, config.polling.history_capacity)
                    .map(Arc::new)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let global = Arc::new(GlobalMonitor::new(
            monitors.clone(),
            GlobalSettings {
                interval: config.aggregation.interval(),
                window: config.aggregation.window(),
                spans: config.aggregation.spans(),
            },
            &config.aggregation.log_path,
        )?);

        let raw = match &config.aggregation.raw_samples_dir {
            Some(dir) => Some(RawSampleWriter::new(
                &monitors,
                dir,
                config.aggregation.raw_interval(),
            )?),
            None => None,
        };

        let scheduler = RequestScheduler::new(
            monitors.clone(),
            SchedulerSettings {
                interval: config.polling.interval(),
                timeout: config.polling.timeout(),
                max_concurrency: config.polling.max_concurrency,
            },
            probe,
        )?
        .with_event_sink(global.clone());

        tracing::info!(
            sites = monitors.len(),
            interval_ms = config.polling.interval_ms,
            timeout_ms = config.polling.timeout_ms,
            max_concurrency = config.polling.max_concurrency,
            raw_samples = raw.is_some(),
            "Monitoring initialized"
        );

        Ok(Self {
            monitors,
            scheduler,
            global,
            raw,
        })
    }

    pub fn monitors(&self) -> &[Arc<SiteMonitor>] {
        &self.monitors
    }

    pub fn global(&self) -> &GlobalMonitor {
        &self.global
    }

    pub fn scheduler(&self) -> &RequestScheduler<P> {
        &self.scheduler
    }

    /// Start aggregation, then polling. Must be called within a tokio runtime.
    pub fn start(&self) -> Result<(), StartupError> {
        self.global.start()?;
        if let Some(raw) = &self.raw {
            raw.start()?;
        }
        self.scheduler.start()?;
        Ok(())
    }

    /// Stop polling first so the writers see a quiescent state, then the
    /// raw writer and the global monitor.
    pub async fn stop(&self) -> Result<(), StartupError> {
        self.scheduler.stop().await;
        if let Some(raw) = &self.raw {
            raw.stop().await;
        }
        self.global.stop().await?;
        tracing::info!("Monitoring stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::probe::ProbeOutcome;
    use std::time::Duration;

    struct AlwaysUp;

    impl Probe for AlwaysUp {
        async fn run(&self, _url: &str, _timeout: Duration) -> ProbeOutcome {
            ProbeOutcome::up(Duration::from_millis(1), 200)
        }
    }

    fn config(dir: &std::path::Path) -> MonitorConfig {
        let mut config = MonitorConfig::default();
        config.sites = vec![
            SiteConfig::named("a", "http://a.test/"),
            SiteConfig::new("http://b.test:8080/"),
        ];
        config.polling.interval_ms = 20;
        config.aggregation.log_path = dir.join("snapshots.jsonl").display().to_string();
        config.aggregation.raw_samples_dir = Some(dir.join("raw").display().to_string());
        config
    }

    #[test]
    fn test_build_names_sites() {
        let dir = tempfile::tempdir().unwrap();
        let monitoring = Monitoring::build_with_probe(&config(dir.path()), AlwaysUp).unwrap();
        let names: Vec<_> = monitoring.monitors().iter().map(|m| m.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b.test:8080"]);
    }

    #[test]
    fn test_build_rejects_bad_site() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.sites.push(SiteConfig::new("ftp://files.test/"));
        assert!(matches!(
            Monitoring::build_with_probe(&config, AlwaysUp),
            Err(StartupError::Config(ConfigError::Validation(_)))
        ));
    }

    #[test]
    fn test_build_rejects_zero_history_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.polling.history_capacity = 0;
        match Monitoring::build_with_probe(&config, AlwaysUp) {
            Err(StartupError::Config(ConfigError::Validation(errors))) => assert_eq!(errors.len(), 1),
            other => panic!("expected a validation error, got {:?}", other.err()),
        }
        // Nothing was opened.
        assert!(!dir.path().join("snapshots.jsonl").exists());
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let dir = tempfile::tempdir().unwrap();
        let monitoring = Monitoring::build_with_probe(&config(dir.path()), AlwaysUp).unwrap();
        monitoring.start().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        monitoring.stop().await.unwrap();

        assert!(!monitoring.scheduler().is_running());
        assert!(!monitoring.global().is_running());
        for monitor in monitoring.monitors() {
            assert!(!monitor.get_metrics().is_empty());
        }

        // Unknown -> Available is logged for both sites.
        let log = std::fs::read_to_string(dir.path().join("snapshots.jsonl")).unwrap();
        assert_eq!(log.lines().filter(|l| l.contains("\"kind\":\"event\"")).count(), 2);
        assert!(dir.path().join("raw/a_raw.jsonl").exists());
    }
}

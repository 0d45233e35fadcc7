//! One poll cycle for one site.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::time;

use crate::lifecycle::ShutdownSignal;
use crate::monitor::SiteMonitor;
use crate::observability::metrics;
use crate::probe::{Probe, ProbeOutcome, Sample};
use crate::scheduler::EventSink;

/// Extra time granted to a probe task past its own timeout before it is
/// abandoned.
pub const PROBE_GRACE: Duration = Duration::from_millis(500);

/// State shared by every poll loop of one scheduler.
pub struct PollContext<P> {
    pub probe: Arc<P>,
    pub permits: Arc<Semaphore>,
    pub timeout: Duration,
    /// Set at most once, possibly while loops are running.
    pub sink: OnceLock<Arc<dyn EventSink>>,
}

/// Run one probe for `monitor` and record its outcome.
///
/// Returns without probing if shutdown fires while waiting for a permit.
pub async fn poll_once<P: Probe>(ctx: &PollContext<P>, monitor: &SiteMonitor, shutdown: &mut ShutdownSignal) {
    let permit = tokio::select! {
        biased;
        _ = shutdown.recv() => return,
        permit = ctx.permits.clone().acquire_owned() => match permit {
            Ok(permit) => permit,
            Err(_) => {
                tracing::error!(site = %monitor.name(), "Permit pool closed, skipping probe");
                return;
            }
        },
    };

    let started_at = Utc::now();
    let outcome = run_probe(ctx, monitor).await;
    drop(permit);

    metrics::record_probe(monitor.name(), outcome.success, outcome.latency);
    tracing::trace!(
        site = %monitor.name(),
        success = outcome.success,
        latency_ms = outcome.latency.as_millis() as u64,
        detail = %outcome.detail,
        "Probe finished"
    );

    let sample = Sample::from_outcome(started_at, &outcome);
    if let Some(event) = monitor.update_metrics(sample) {
        if let Some(sink) = ctx.sink.get() {
            sink.record(&event);
        }
    }
}

/// Run the probe on its own task, abandoning it if it outlives its deadline.
async fn run_probe<P: Probe>(ctx: &PollContext<P>, monitor: &SiteMonitor) -> ProbeOutcome {
    let probe = ctx.probe.clone();
    let url = monitor.url().to_string();
    let timeout = ctx.timeout;

    let _in_flight = metrics::InFlightGuard::new();
    let mut task = tokio::spawn(async move { probe.run(&url, timeout).await });

    match time::timeout(timeout + PROBE_GRACE, &mut task).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            tracing::error!(site = %monitor.name(), error = %e, "Probe task failed");
            ProbeOutcome::down(timeout, None, format!("probe task failed: {}", e))
        }
        Err(_) => {
            task.abort();
            tracing::warn!(site = %monitor.name(), "Probe ignored its timeout, abandoned");
            ProbeOutcome::timed_out(timeout)
        }
    }
}

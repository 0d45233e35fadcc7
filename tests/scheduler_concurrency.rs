//! Scheduler concurrency bound, state transitions and quiescence.

mod common;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sitewatch::monitor::{Availability, AvailabilityEvent, SiteMonitor};
use sitewatch::scheduler::{EventSink, RequestScheduler, SchedulerSettings};

use common::{eventually, ScriptedProbe};

fn sites(n: usize) -> Vec<Arc<SiteMonitor>> {
    (0..n)
        .map(|i| Arc::new(SiteMonitor::new(format!("site-{}", i), &format!("http://site-{}.test/", i), 1_000).unwrap()))
        .collect()
}

#[derive(Default)]
struct Collect(Mutex<Vec<AvailabilityEvent>>);

impl EventSink for Collect {
    fn record(&self, event: &AvailabilityEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

#[tokio::test]
async fn test_in_flight_never_exceeds_limit() {
    let monitors = sites(5);
    let probe = ScriptedProbe::new(Duration::from_millis(100), |_: usize| false);
    let peak = probe.peak();
    let scheduler = RequestScheduler::new(
        monitors.clone(),
        SchedulerSettings {
            interval: Duration::from_millis(20),
            timeout: Duration::from_secs(1),
            max_concurrency: 2,
        },
        probe,
    )
    .unwrap();

    scheduler.start().unwrap();
    tokio::time::sleep(Duration::from_millis(800)).await;
    scheduler.stop().await;

    assert_eq!(peak.load(Ordering::SeqCst), 2);
    assert_eq!(scheduler.available_permits(), 2);

    let probed: usize = monitors.iter().map(|m| m.get_metrics().len()).sum();
    assert!(probed >= 10, "expected steady progress, got {} probes", probed);
    for monitor in &monitors {
        assert_eq!(monitor.get_state().availability, Availability::Unavailable);
    }
}

#[tokio::test]
async fn test_fail_fail_success_transitions() {
    let monitor = sites(1);
    let sink = Arc::new(Collect::default());
    let probe = ScriptedProbe::new(Duration::from_millis(1), |call: usize| call >= 2);
    let scheduler = RequestScheduler::new(
        monitor.clone(),
        SchedulerSettings {
            interval: Duration::from_millis(30),
            timeout: Duration::from_secs(1),
            max_concurrency: 1,
        },
        probe,
    )
    .unwrap()
    .with_event_sink(sink.clone());

    scheduler.start().unwrap();
    let m = monitor[0].clone();
    assert!(
        eventually(Duration::from_secs(2), || {
            let m = m.clone();
            async move { m.get_metrics().len() >= 3 }
        })
        .await
    );
    scheduler.stop().await;

    let samples = monitor[0].get_metrics();
    assert!(!samples[0].is_success());
    assert!(!samples[1].is_success());
    assert!(samples[2].is_success());

    let events = sink.0.lock().unwrap().clone();
    let transitions: Vec<_> = events.iter().map(|e| (e.from, e.to)).collect();
    assert_eq!(
        transitions,
        vec![
            (Availability::Unknown, Availability::Unavailable),
            (Availability::Unavailable, Availability::Available),
        ]
    );

    let state = monitor[0].get_state();
    assert_eq!(state.availability, Availability::Available);
    assert_eq!(state.recovered_at, Some(samples[2].timestamp));
    assert_eq!(state.unavailable_since, None);
    assert_eq!(events[0].timestamp, samples[0].timestamp);
}

#[tokio::test]
async fn test_no_updates_after_stop() {
    let monitors = sites(3);
    let probe = ScriptedProbe::new(Duration::from_millis(40), |call: usize| call % 2 == 0);
    let in_flight = probe.in_flight();
    let scheduler = RequestScheduler::new(
        monitors.clone(),
        SchedulerSettings {
            interval: Duration::from_millis(10),
            timeout: Duration::from_secs(1),
            max_concurrency: 2,
        },
        probe,
    )
    .unwrap();

    scheduler.start().unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    scheduler.stop().await;
    assert!(!scheduler.is_running());
    assert_eq!(in_flight.load(Ordering::SeqCst), 0);

    let counts: Vec<usize> = monitors.iter().map(|m| m.get_metrics().len()).collect();
    let states: Vec<_> = monitors.iter().map(|m| m.get_state()).collect();
    tokio::time::sleep(Duration::from_millis(200)).await;

    for (i, monitor) in monitors.iter().enumerate() {
        assert_eq!(monitor.get_metrics().len(), counts[i]);
        assert_eq!(monitor.get_state(), states[i]);
    }

    // Stopping again is harmless.
    scheduler.stop().await;
}

#[tokio::test]
async fn test_stop_while_waiting_for_permits() {
    let monitors = sites(4);
    let probe = ScriptedProbe::new(Duration::from_millis(300), |_: usize| true);
    let scheduler = RequestScheduler::new(
        monitors.clone(),
        SchedulerSettings {
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(1),
            max_concurrency: 1,
        },
        probe,
    )
    .unwrap();

    scheduler.start().unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = std::time::Instant::now();
    scheduler.stop().await;
    // Only the probe holding the permit finishes; waiters bail out.
    assert!(started.elapsed() < Duration::from_millis(600));
    let probed: usize = monitors.iter().map(|m| m.get_metrics().len()).sum();
    assert_eq!(probed, 1);
}

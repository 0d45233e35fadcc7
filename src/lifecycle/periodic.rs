//! Cancellable periodic task.
//!
//! # Responsibilities
//! - Run a tick function at a fixed interval on its own tokio task
//! - Align ticks to their start time: wait `interval - elapsed`, floored at zero
//! - Skip (never queue) ticks missed by an overrunning tick
//! - Exit at the next wake point once shutdown is triggered

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::lifecycle::shutdown::{Shutdown, ShutdownSignal};

/// When the first tick fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstTick {
    /// Tick as soon as the task starts.
    Immediate,
    /// Wait one full interval first.
    AfterInterval,
}

/// A named, fixed-interval loop.
#[derive(Debug, Clone)]
pub struct PeriodicTask {
    name: String,
    interval: Duration,
    first_tick: FirstTick,
}

impl PeriodicTask {
    pub fn new(name: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            interval,
            first_tick: FirstTick::Immediate,
        }
    }

    pub fn first_tick(mut self, first_tick: FirstTick) -> Self {
        self.first_tick = first_tick;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawn the loop. `tick` is awaited to completion each period.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F, Fut>(self, shutdown: ShutdownSignal, tick: F) -> JoinHandle<()>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(self.run(shutdown, tick))
    }

    /// Spawn the loop with its own shutdown coordinator.
    pub fn start<F, Fut>(self, tick: F) -> PeriodicHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = self.name.clone();
        let shutdown = Shutdown::new();
        let join = self.spawn(shutdown.subscribe(), tick);
        PeriodicHandle { name, shutdown, join }
    }

    async fn run<F, Fut>(self, mut shutdown: ShutdownSignal, mut tick: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        tracing::debug!(task = %self.name, interval_ms = self.interval.as_millis() as u64, "Periodic task starting");

        if self.first_tick == FirstTick::AfterInterval && !wait(&mut shutdown, self.interval).await {
            tracing::debug!(task = %self.name, "Periodic task stopped");
            return;
        }

        loop {
            if shutdown.is_triggered() {
                break;
            }

            let started = Instant::now();
            tick().await;

            let elapsed = started.elapsed();
            if elapsed > self.interval {
                tracing::debug!(
                    task = %self.name,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Tick overran its interval, next tick fires immediately"
                );
            }

            if !wait(&mut shutdown, self.interval.saturating_sub(elapsed)).await {
                break;
            }
        }

        tracing::debug!(task = %self.name, "Periodic task stopped");
    }
}

/// A running periodic task that owns its shutdown.
#[derive(Debug)]
pub struct PeriodicHandle {
    name: String,
    shutdown: Shutdown,
    join: JoinHandle<()>,
}

impl PeriodicHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signal the loop and wait for it to exit. The current tick, if any,
    /// runs to completion first.
    pub async fn stop(self) {
        self.shutdown.trigger();
        if let Err(e) = self.join.await {
            tracing::error!(task = %self.name, error = %e, "Periodic task terminated abnormally");
        }
    }
}

/// Sleep for `duration` unless shutdown fires first. Returns `false` on shutdown.
async fn wait(shutdown: &mut ShutdownSignal, duration: Duration) -> bool {
    tokio::select! {
        biased;
        _ = shutdown.recv() => false,
        _ = time::sleep(duration) => true,
    }
}

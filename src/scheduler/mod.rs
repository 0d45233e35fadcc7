//! Request scheduling subsystem.
//!
//! # Data Flow
//! ```text
//! RequestScheduler::start()
//!     → one PeriodicTask per site (request.rs)
//!         → poll.rs tick:
//!             acquire permit from the shared pool (interruptible)
//!             → spawn probe task, bounded by timeout
//!             → drop permit (every exit path)
//!             → SiteMonitor::update_metrics(sample)
//!             → EventSink::record(transition)
//!
//! RequestScheduler::stop()
//!     → trigger shutdown → await every poll loop
//!     → no update_metrics afterwards
//! ```
//!
//! # Design Decisions
//! - One global permit pool sized `max_concurrency`, independent of site count
//! - Permits are RAII guards, released on success, failure, timeout and panic
//! - Overrunning probes make the next tick fire immediately; ticks never queue
//! - Probe failures never surface as errors here

pub mod poll;
pub mod request;

use crate::monitor::AvailabilityEvent;

pub use request::{RequestScheduler, SchedulerError, SchedulerSettings};

/// Receives availability transitions as they happen.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &AvailabilityEvent);
}

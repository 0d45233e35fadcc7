//! Probe execution subsystem.
//!
//! # Data Flow
//! ```text
//! poll loop tick
//!     → Probe::run(url, timeout) (http.rs: one bounded GET)
//!     → ProbeOutcome (success, latency, code, detail)
//!     → sample.rs Sample (timestamped, immutable)
//!     → site monitor history + state machine
//! ```
//!
//! # Design Decisions
//! - Every failure mode (DNS, connect, protocol, status, timeout) becomes `success = false`
//! - No retries here; retry policy belongs to the scheduler
//! - `Probe` is a trait so the scheduler can be driven by scripted probes

pub mod http;
pub mod sample;

use std::future::Future;
use std::time::Duration;

pub use http::HttpProbe;
pub use sample::{ProbeStatus, Sample};

/// Result of one probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    /// Whether the site answered in time with a non-error status.
    pub success: bool,
    /// Time spent on the probe.
    pub latency: Duration,
    /// HTTP status code, when a response was received.
    pub code: Option<u16>,
    /// Human-readable detail (status line or failure reason).
    pub detail: String,
}

impl ProbeOutcome {
    pub fn up(latency: Duration, code: u16) -> Self {
        Self {
            success: true,
            latency,
            code: Some(code),
            detail: format!("HTTP {}", code),
        }
    }

    pub fn down(latency: Duration, code: Option<u16>, detail: impl Into<String>) -> Self {
        Self {
            success: false,
            latency,
            code,
            detail: detail.into(),
        }
    }

    /// Outcome used when a probe exceeded its deadline.
    pub fn timed_out(timeout: Duration) -> Self {
        Self::down(timeout, None, format!("timed out after {} ms", timeout.as_millis()))
    }
}

/// One bounded-time network check.
///
/// Implementations must never panic or return early with an error: every
/// failure is reported through `ProbeOutcome::success`.
pub trait Probe: Send + Sync + 'static {
    fn run(&self, url: &str, timeout: Duration) -> impl Future<Output = ProbeOutcome> + Send;
}

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields (site, url, latency) on every event
//! - Metrics go through the `metrics` facade; without an installed recorder they are no-ops
//! - `RUST_LOG` overrides the configured level

pub mod logging;
pub mod metrics;

//! Global aggregation and persistence subsystem.
//!
//! # Data Flow
//! ```text
//! GlobalMonitor periodic tick (global.rs):
//!     every SiteMonitor → state snapshot + samples in window
//!     → snapshot.rs GlobalSnapshot (counts, latency summary, per-site stats)
//!     → log.rs append one JSON line
//!
//! Availability transition (from the scheduler):
//!     → GlobalMonitor::log(event) → log.rs append immediately
//!
//! RawSampleWriter periodic tick (raw.rs, optional):
//!     samples newer than the last dump → <dir>/<site>_raw.jsonl
//! ```
//!
//! # Design Decisions
//! - Append-only JSON lines; a written record is never rewritten
//! - Persistence is best-effort: a failed write is logged and the loop continues
//! - After stop() the log is closed and rejects further writes
//! - Snapshots read each site independently (no cross-site atomicity)

pub mod global;
pub mod log;
pub mod raw;
pub mod snapshot;

pub use global::{GlobalMonitor, GlobalMonitorError, GlobalSettings};
pub use log::{JsonLinesLog, LogRecord, PersistError};
pub use raw::RawSampleWriter;
pub use snapshot::{GlobalSnapshot, SiteSummary, SpanStats};

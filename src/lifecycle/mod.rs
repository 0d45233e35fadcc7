//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → site monitors → global monitor → scheduler
//!     → start aggregation, then polling
//!
//! Periodic tasks (periodic.rs):
//!     tick → wait(interval - elapsed) or shutdown → tick ...
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → stop polling (quiescent) → stop aggregation (log closed)
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, nothing starts half-configured
//! - Ordered shutdown: writers of site state stop before readers that persist it
//! - Every wait is interruptible; idle loops never delay shutdown by a full interval

pub mod periodic;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use periodic::{FirstTick, PeriodicHandle, PeriodicTask};
pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{Monitoring, StartupError};

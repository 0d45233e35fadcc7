//! Per-site monitoring subsystem.
//!
//! # Data Flow
//! ```text
//! poll loop
//!     → SiteMonitor::update_metrics(sample)
//!         → history buffer (every sample)
//!         → state.rs transition (Unknown → Available | Unavailable)
//!         → new Arc<SiteState> published
//!
//! readers (global monitor, dashboards, tests)
//!     → get_state()   (lock-free Arc snapshot)
//!     → get_metrics() / get_metrics_between()
//!     → window.rs WindowStats over a time window
//! ```
//!
//! # State Transitions
//! ```text
//! Unknown | Unavailable → Available: successful probe
//! Unknown | Available → Unavailable: failed probe
//! Same outcome repeated: no transition, only last_updated moves
//! ```
//!
//! # Design Decisions
//! - Single writer per site (its own poll loop); many readers
//! - Readers never block the writer: state is swapped atomically
//! - Every transition is reported as an `AvailabilityEvent`

pub mod site;
pub mod state;
pub mod window;

pub use site::{SiteError, SiteMonitor};
pub use state::{Availability, AvailabilityEvent, SiteState};
pub use window::{LatencySummary, WindowStats};

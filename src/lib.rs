//! Concurrent site availability monitor.

pub mod aggregate;
pub mod config;
pub mod history;
pub mod lifecycle;
pub mod monitor;
pub mod observability;
pub mod probe;
pub mod scheduler;

pub use aggregate::GlobalMonitor;
pub use config::MonitorConfig;
pub use history::HistoryBuffer;
pub use lifecycle::{Monitoring, Shutdown};
pub use monitor::SiteMonitor;
pub use probe::{HttpProbe, Probe, ProbeOutcome, Sample};
pub use scheduler::RequestScheduler;

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → MonitorConfig (validated, immutable)
//!     → explicit settings handed to each subsystem at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no global lookup
//! - All fields except the site list have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AggregationConfig, LogFormat, MonitorConfig, ObservabilityConfig, PollingConfig, SiteConfig, WindowConfig,
};
pub use validation::{validate_config, validate_log_level, ValidationError};

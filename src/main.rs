//! sitewatch: concurrent site availability monitor.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌────────────────────────────────────────────────────────────────┐
//!   │                          sitewatch                             │
//!   │                                                                │
//!   │  ┌───────────┐  permit   ┌────────────┐  sample  ┌──────────┐  │
//!   │  │ scheduler │──────────▶│   probe    │─────────▶│ monitor  │  │
//!   │  │ poll loops│  pool     │ (HTTP GET) │          │ per site │  │
//!   │  └───────────┘           └────────────┘          └────┬─────┘  │
//!   │        │ transitions                                  │ reads  │
//!   │        ▼                                              ▼        │
//!   │  ┌──────────────────────────────────────────────────────────┐  │
//!   │  │ aggregate: global snapshots + events → JSON lines log    │  │
//!   │  └──────────────────────────────────────────────────────────┘  │
//!   │                                                                │
//!   │  config · observability · lifecycle (startup, signals, stop)   │
//!   └────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use sitewatch::config::{load_config, validate_log_level};
use sitewatch::lifecycle::signals::wait_for_termination;
use sitewatch::lifecycle::Monitoring;
use sitewatch::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "sitewatch", version, about = "Concurrent site availability monitor")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "sitewatch.toml")]
    config: PathBuf,

    /// Override the configured log level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(level) = cli.log_level {
        if let Err(e) = validate_log_level(&level) {
            eprintln!("Invalid --log-level: {}", e);
            return ExitCode::FAILURE;
        }
        config.observability.log_level = level;
    }

    logging::init_logging(&config.observability);
    tracing::info!(config = %cli.config.display(), sites = config.sites.len(), "sitewatch starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let monitoring = match Monitoring::build(&config) {
        Ok(monitoring) => monitoring,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = monitoring.start() {
        tracing::error!(error = %e, "Startup failed");
        return ExitCode::FAILURE;
    }

    wait_for_termination().await;

    if let Err(e) = monitoring.stop().await {
        tracing::error!(error = %e, "Shutdown incomplete");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}

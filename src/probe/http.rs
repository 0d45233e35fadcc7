//! HTTP probe executor.
//!
//! # Responsibilities
//! - Issue a single GET against a site
//! - Enforce the probe timeout on the whole request
//! - Normalize every failure into a failed outcome

use std::time::{Duration, Instant};
use tokio::time;

use crate::probe::{Probe, ProbeOutcome};

const USER_AGENT: &str = concat!("sitewatch/", env!("CARGO_PKG_VERSION"));

/// Probe backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    /// Build a probe with a fresh client.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .no_proxy()
            .build()?;
        Ok(Self { client })
    }

    /// Build a probe around an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Probe for HttpProbe {
    async fn run(&self, url: &str, timeout: Duration) -> ProbeOutcome {
        let started = Instant::now();
        let request = self.client.get(url).timeout(timeout).send();

        match time::timeout(timeout, request).await {
            Ok(Ok(response)) => {
                let latency = started.elapsed();
                let status = response.status();
                if status.is_client_error() || status.is_server_error() {
                    tracing::debug!(url = %url, status = %status, "Probe failed: error status");
                    ProbeOutcome::down(latency, Some(status.as_u16()), format!("HTTP {}", status.as_u16()))
                } else {
                    ProbeOutcome::up(latency, status.as_u16())
                }
            }
            Ok(Err(e)) if e.is_timeout() => {
                tracing::debug!(url = %url, "Probe failed: timeout");
                ProbeOutcome::timed_out(timeout)
            }
            Ok(Err(e)) => {
                let detail = if e.is_connect() {
                    format!("connection error: {}", e)
                } else {
                    format!("request error: {}", e)
                };
                tracing::debug!(url = %url, error = %e, "Probe failed");
                ProbeOutcome::down(started.elapsed(), None, detail)
            }
            Err(_) => {
                tracing::debug!(url = %url, "Probe failed: timeout");
                ProbeOutcome::timed_out(timeout)
            }
        }
    }
}

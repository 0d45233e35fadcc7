//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use sitewatch::probe::{Probe, ProbeOutcome};

/// Behavior of a mock site, adjustable while it runs.
#[derive(Debug, Default)]
pub struct MockBehavior {
    status: AtomicU16,
    delay_ms: AtomicU64,
    hits: AtomicUsize,
}

impl MockBehavior {
    pub fn set_status(&self, status: u16) {
        self.status.store(status, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start a mock site on an ephemeral port. It answers every request with
/// the current status after the current delay.
pub async fn start_mock_site(status: u16) -> (SocketAddr, Arc<MockBehavior>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let behavior = Arc::new(MockBehavior::default());
    behavior.set_status(status);

    let b = behavior.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let b = b.clone();
            tokio::spawn(async move {
                b.hits.fetch_add(1, Ordering::SeqCst);
                let delay = Duration::from_millis(b.delay_ms.load(Ordering::SeqCst));
                let status = b.status.load(Ordering::SeqCst);
                respond(socket, status, delay).await;
            });
        }
    });

    (addr, behavior)
}

async fn respond(mut socket: TcpStream, status: u16, delay: Duration) {
    let mut buf = vec![0u8; 4096];
    let mut read = 0;
    while read < buf.len() {
        match socket.read(&mut buf[read..]).await {
            Ok(0) | Err(_) => return,
            Ok(n) => read += n,
        }
        if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    tokio::time::sleep(delay).await;

    let reason = match status {
        200 => "OK",
        204 => "No Content",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    };
    let body = "ok";
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// A probe driven by a closure over the call count, which also tracks how
/// many calls run at once.
pub struct ScriptedProbe<F> {
    script: F,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl<F> ScriptedProbe<F>
where
    F: Fn(usize) -> bool + Send + Sync + 'static,
{
    pub fn new(delay: Duration, script: F) -> Self {
        Self {
            script,
            delay,
            calls: AtomicUsize::new(0),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of the highest observed concurrency.
    pub fn peak(&self) -> Arc<AtomicUsize> {
        self.peak.clone()
    }

    pub fn in_flight(&self) -> Arc<AtomicUsize> {
        self.in_flight.clone()
    }
}

impl<F> Probe for ScriptedProbe<F>
where
    F: Fn(usize) -> bool + Send + Sync + 'static,
{
    async fn run(&self, _url: &str, _timeout: Duration) -> ProbeOutcome {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        let success = (self.script)(call);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if success {
            ProbeOutcome::up(self.delay, 200)
        } else {
            ProbeOutcome::down(self.delay, None, "scripted failure")
        }
    }
}

/// Poll `check` until it holds or `deadline` passes.
pub async fn eventually<F, Fut>(deadline: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = tokio::time::Instant::now();
    loop {
        if check().await {
            return true;
        }
        if start.elapsed() > deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

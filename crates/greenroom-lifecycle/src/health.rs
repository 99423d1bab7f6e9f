//! Health verification over plain HTTP.
//!
//! A service the platform calls stable is not necessarily serving: the
//! container may still be booting, or crash-looping behind a healthy
//! task state. The verifier resolves the service's public address and
//! probes it until it answers 2xx or the attempt budget runs out.

use std::time::Duration;

use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use greenroom_core::HealthSettings;
use greenroom_platform::ServiceQuery;

use crate::poll::poll_attempts;

/// Result of a single HTTP probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbeStatus {
    /// 2xx response.
    Passed,
    /// Non-2xx response.
    Rejected,
    /// Connection, request, or deadline failure.
    Unreachable,
}

/// Verifies a freshly deployed environment actually serves traffic.
pub struct HealthVerifier {
    query: ServiceQuery,
    app_port: u16,
    health_path: String,
    probe_timeout: Duration,
    retry_delay: Duration,
}

impl HealthVerifier {
    pub fn new(query: ServiceQuery, settings: &HealthSettings, app_port: u16) -> Self {
        Self {
            query,
            app_port,
            health_path: settings.path.clone(),
            probe_timeout: settings.probe_timeout(),
            retry_delay: settings.retry_delay(),
        }
    }

    /// Probe the service until it answers 2xx, making at most
    /// `max_attempts` attempts with a fixed delay in between.
    ///
    /// Address resolution comes first: a service without a routable
    /// address fails immediately, with zero probe attempts. Each attempt
    /// probes the health path and falls back to the root path, so
    /// applications without a dedicated health endpoint still verify.
    /// Network errors are consumed as failed probes, never raised.
    pub async fn check(&self, name: &str, max_attempts: u32) -> bool {
        let Some(ip) = self.query.resolve_address(name).await else {
            warn!(service = %name, "no routable address; health check failed without probing");
            return false;
        };

        let authority = format!("{ip}:{}", self.app_port);
        info!(
            service = %name,
            address = %authority,
            max_attempts,
            "verifying environment health"
        );

        let target = authority.clone();
        let path = self.health_path.clone();
        let probe_timeout = self.probe_timeout;
        let outcome = poll_attempts(
            move || {
                let authority = target.clone();
                let path = path.clone();
                async move { attempt(&authority, &path, probe_timeout).await }
            },
            self.retry_delay,
            max_attempts,
        )
        .await;

        if outcome.terminal {
            info!(
                service = %name,
                attempts = outcome.attempts,
                "environment is serving traffic"
            );
        } else {
            warn!(
                service = %name,
                attempts = outcome.attempts,
                "environment never became healthy"
            );
        }
        outcome.terminal
    }
}

/// One attempt: the health path first, the root path as fallback.
async fn attempt(authority: &str, health_path: &str, timeout: Duration) -> bool {
    match http_get(authority, health_path, timeout).await {
        ProbeStatus::Passed => true,
        first => {
            debug!(%authority, ?first, "health path probe failed; trying root");
            match http_get(authority, "/", timeout).await {
                ProbeStatus::Passed => true,
                second => {
                    debug!(%authority, ?second, "root probe failed");
                    false
                }
            }
        }
    }
}

/// Perform one HTTP GET and classify the outcome.
async fn http_get(authority: &str, path: &str, timeout: Duration) -> ProbeStatus {
    let uri = format!("http://{authority}{path}");

    let result = tokio::time::timeout(timeout, async {
        let stream = match TcpStream::connect(authority).await {
            Ok(s) => s,
            Err(e) => {
                debug!(error = %e, %uri, "probe connection failed");
                return ProbeStatus::Unreachable;
            }
        };

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = match hyper::client::conn::http1::handshake(io).await {
            Ok(pair) => pair,
            Err(e) => {
                debug!(error = %e, %uri, "probe handshake failed");
                return ProbeStatus::Unreachable;
            }
        };

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let req = http::Request::builder()
            .method("GET")
            .uri(&uri)
            .header("host", authority)
            .header("user-agent", "greenroom-health/0.1")
            .body(http_body_util::Empty::<bytes::Bytes>::new())
            .unwrap();

        match sender.send_request(req).await {
            Ok(resp) => {
                if resp.status().is_success() {
                    ProbeStatus::Passed
                } else {
                    debug!(status = %resp.status(), %uri, "probe non-2xx");
                    ProbeStatus::Rejected
                }
            }
            Err(e) => {
                debug!(error = %e, %uri, "probe request failed");
                ProbeStatus::Unreachable
            }
        }
    })
    .await;

    match result {
        Ok(status) => status,
        Err(_) => {
            debug!(%uri, "probe timed out");
            ProbeStatus::Unreachable
        }
    }
}

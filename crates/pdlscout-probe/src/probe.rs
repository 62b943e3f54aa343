// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The probe abstraction shared by the IPP, HTTP and SNMP fingerprinting
// paths, plus the HTTP plumbing the first two have in common.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use pdlscout_core::error::ProbeError;
use pdlscout_core::types::{Protocol, ProbeResult};

/// A best-effort query that extracts a fingerprint from a device.
///
/// Implementations never panic on bad input from the network; every failure
/// is returned as a [`ProbeError`].
#[async_trait]
pub trait Probe: Send + Sync {
    /// Which protocol this probe speaks.
    fn protocol(&self) -> Protocol;

    /// Query `host` once, bounded by the probe's own timeout.
    async fn probe(&self, host: &str) -> ProbeResult;
}

/// Build an HTTP client for talking to printer web and IPP endpoints.
///
/// Certificate validation is disabled: printers routinely serve self-signed
/// or expired certificates after redirecting to HTTPS, and rejecting them
/// would hide the very device being identified.
pub(crate) fn insecure_client(timeout: Duration) -> Result<reqwest::Client, ProbeError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(true)
        .build()
        .map_err(|e| ProbeError::Transport(format!("cannot build HTTP client: {e}")))
}

/// Reject 4xx/5xx answers; an error page never describes the device.
pub(crate) fn require_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProbeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(ProbeError::Transport(format!(
        "HTTP Error {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    )))
}

/// Read at most `limit` bytes of a response body.
///
/// A body that breaks off after some data arrived (truncated chunked
/// encoding, connection reset) still yields the bytes received so far.
pub(crate) async fn read_body(
    mut response: reqwest::Response,
    limit: Option<usize>,
) -> Result<Vec<u8>, ProbeError> {
    let mut body = Vec::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                body.extend_from_slice(&chunk);
                if let Some(limit) = limit
                    && body.len() >= limit
                {
                    body.truncate(limit);
                    break;
                }
            }
            Ok(None) => break,
            Err(e) if !body.is_empty() => {
                warn!(received = body.len(), error = %e, "body truncated, using partial data");
                break;
            }
            Err(e) => return Err(transport_error(e)),
        }
    }
    debug!(bytes = body.len(), "read response body");
    Ok(body)
}

/// Convert a reqwest failure into a transport error with a readable reason.
pub(crate) fn transport_error(err: reqwest::Error) -> ProbeError {
    if err.is_timeout() {
        ProbeError::Transport("timed out".into())
    } else if err.is_connect() {
        ProbeError::Transport(format!("connection failed: {err}"))
    } else {
        ProbeError::Transport(err.to_string())
    }
}

/// Format `host:port` for a URL, bracketing bare IPv6 addresses.
pub(crate) fn authority(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP fingerprinting probe: the `<title>` of a printer's embedded web
// server usually carries its model name.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use tracing::{debug, instrument};

use pdlscout_core::types::{Fingerprint, ProbeResult, Protocol};

use crate::probe::{
    Probe, authority, insecure_client, read_body, require_success, transport_error,
};

/// Only the head of the page is read; the title is always near the top and
/// some embedded web UIs serve megabytes of inline script.
pub const TITLE_SCAN_BYTES: usize = 5000;

/// First `<title>` element, keeping only characters that plausibly belong to
/// a model name. Capture stops at the first character outside the class.
static TITLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ims-u)<title[^>]*>\s*([a-zA-Z0-9 ._/-]+).*?</title>")
        .expect("valid title pattern")
});

/// Probe that fetches `/` from the device's web interface.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    port: u16,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }

    fn url(&self, host: &str) -> String {
        if self.port == 80 {
            format!("http://{}/", authority(host, self.port).trim_end_matches(":80"))
        } else {
            format!("http://{}/", authority(host, self.port))
        }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    fn protocol(&self) -> Protocol {
        Protocol::Http
    }

    #[instrument(skip(self), fields(port = self.port))]
    async fn probe(&self, host: &str) -> ProbeResult {
        let client = insecure_client(self.timeout)?;
        let response = client
            .get(self.url(host))
            .send()
            .await
            .map_err(transport_error)?;

        debug!(status = %response.status(), "web interface answered");
        let response = require_success(response)?;
        let head = read_body(response, Some(TITLE_SCAN_BYTES)).await?;
        let title = extract_title(&head).unwrap_or_default();
        Ok(Fingerprint::new(title, ""))
    }
}

/// Extract the usable part of the first HTML title, if any.
pub fn extract_title(html: &[u8]) -> Option<String> {
    let caps = TITLE_PATTERN.captures(html)?;
    let title = String::from_utf8_lossy(caps.get(1)?.as_bytes())
        .trim()
        .to_string();
    (!title.is_empty()).then_some(title)
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// IPP fingerprinting probe.
//
// Sends one Get-Printer-Attributes request (RFC 8011 §4.2.5) asking for the
// `printer-description` group and scrapes the IEEE 1284 device ID fields out
// of the raw response:
//   - `MDL:` — model name, e.g. "hp LaserJet 4250"
//   - `CMD:` — command sets, e.g. "PCL,PJL,POSTSCRIPT"
//
// The response is never decoded as IPP. Printers disagree on where they put
// the device ID (printer-device-id, printer-info, vendor extensions) and a
// byte scan finds it in all of them.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use tracing::{debug, instrument};

use pdlscout_core::types::{Fingerprint, ProbeResult, Protocol};

use crate::probe::{
    Probe, authority, insecure_client, read_body, require_success, transport_error,
};

// ---------------------------------------------------------------------------
// Wire constants (RFC 8010)
// ---------------------------------------------------------------------------

/// IPP version 1.1.
const IPP_VERSION: [u8; 2] = [0x01, 0x01];

/// Get-Printer-Attributes operation identifier.
const OP_GET_PRINTER_ATTRIBUTES: u16 = 0x000B;

/// Request id carried by every probe.
const REQUEST_ID: u32 = 0x0001_AB10;

/// Operation attributes group delimiter.
const TAG_OPERATION_ATTRIBUTES: u8 = 0x01;

/// End-of-attributes-tag.
const TAG_END_OF_ATTRIBUTES: u8 = 0x03;

/// keyword (US-ASCII string).
const VALUE_TAG_KEYWORD: u8 = 0x44;

/// uri (US-ASCII string).
const VALUE_TAG_URI: u8 = 0x45;

/// charset (US-ASCII string).
const VALUE_TAG_CHARSET: u8 = 0x47;

/// naturalLanguage (US-ASCII string).
const VALUE_TAG_NATURAL_LANGUAGE: u8 = 0x48;

/// Printer URI sent in the request. Most devices ignore it; a fixed value
/// keeps the payload identical for every target.
const PRINTER_URI: &str = "ipp://localhost/ipp/";

/// Upper bound on the response body kept for scanning.
const MAX_RESPONSE_BYTES: usize = 1024 * 1024;

static MODEL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)MDL:(.+?);").expect("valid MDL pattern"));

static COMMAND_SET_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)CMD:(.+?);").expect("valid CMD pattern"));

/// Probe that POSTs a raw Get-Printer-Attributes request to port 631.
#[derive(Debug, Clone)]
pub struct IppProbe {
    port: u16,
    timeout: Duration,
}

impl IppProbe {
    /// `timeout` is the full budget for the exchange (already doubled by the
    /// caller's configuration).
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }

    fn url(&self, host: &str) -> String {
        format!("http://{}/", authority(host, self.port))
    }
}

#[async_trait]
impl Probe for IppProbe {
    fn protocol(&self) -> Protocol {
        Protocol::Ipp
    }

    #[instrument(skip(self), fields(port = self.port))]
    async fn probe(&self, host: &str) -> ProbeResult {
        let client = insecure_client(self.timeout)?;

        debug!("sending Get-Printer-Attributes");
        let response = client
            .post(self.url(host))
            .header(reqwest::header::CONTENT_TYPE, "application/ipp")
            .body(get_printer_attributes_request())
            .send()
            .await
            .map_err(transport_error)?;
        let response = require_success(response)?;

        let body = read_body(response, Some(MAX_RESPONSE_BYTES)).await?;
        let fingerprint = parse_ipp_response(&body);
        debug!(model = %fingerprint.model, languages = %fingerprint.languages, "parsed IPP response");
        Ok(fingerprint)
    }
}

/// Encode the fixed Get-Printer-Attributes request.
pub fn get_printer_attributes_request() -> Vec<u8> {
    let mut buf = Vec::with_capacity(160);
    buf.extend_from_slice(&IPP_VERSION);
    buf.extend_from_slice(&OP_GET_PRINTER_ATTRIBUTES.to_be_bytes());
    buf.extend_from_slice(&REQUEST_ID.to_be_bytes());
    buf.push(TAG_OPERATION_ATTRIBUTES);
    write_attr(&mut buf, VALUE_TAG_CHARSET, "attributes-charset", "utf-8");
    write_attr(
        &mut buf,
        VALUE_TAG_NATURAL_LANGUAGE,
        "attributes-natural-language",
        "en",
    );
    write_attr(&mut buf, VALUE_TAG_URI, "printer-uri", PRINTER_URI);
    write_attr(
        &mut buf,
        VALUE_TAG_KEYWORD,
        "requested-attributes",
        "printer-description",
    );
    buf.push(TAG_END_OF_ATTRIBUTES);
    buf
}

/// Write a single attribute: value-tag, name-length, name, value-length, value.
fn write_attr(buf: &mut Vec<u8>, value_tag: u8, name: &str, value: &str) {
    buf.push(value_tag);
    buf.extend_from_slice(&(name.len() as u16).to_be_bytes());
    buf.extend_from_slice(name.as_bytes());
    buf.extend_from_slice(&(value.len() as u16).to_be_bytes());
    buf.extend_from_slice(value.as_bytes());
}

/// Pull the model (`MDL:`) and command set (`CMD:`) out of a raw response.
pub fn parse_ipp_response(body: &[u8]) -> Fingerprint {
    Fingerprint {
        model: first_capture(&MODEL_PATTERN, body),
        languages: first_capture(&COMMAND_SET_PATTERN, body),
    }
}

fn first_capture(pattern: &Regex, haystack: &[u8]) -> String {
    pattern
        .captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
        .unwrap_or_default()
}

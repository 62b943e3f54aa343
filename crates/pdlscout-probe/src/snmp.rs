// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SNMP fingerprinting probe.
//
// Walks two sub-trees with SNMPv1 get-next, community "public":
//   - HOST-RESOURCES-MIB hrDeviceDescr           1.3.6.1.2.1.25.3.2.1.3
//   - Printer-MIB prtInterpreterDescription      1.3.6.1.2.1.43.15.1.1.5.1
//
// The first device description is the model; the interpreter descriptions,
// joined with commas, are the language list.
//
// The SNMP client is behind the `snmp` cargo feature. Builds without it keep
// the probe but report `ProbeError::DependencyUnavailable`.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use pdlscout_core::error::ProbeError;
use pdlscout_core::types::{Fingerprint, ProbeResult, Protocol};

use crate::probe::Probe;

/// hrDeviceDescr.
pub const DEVICE_DESCRIPTION_OID: &str = "1.3.6.1.2.1.25.3.2.1.3";

/// prtInterpreterDescription for the first printer.
pub const INTERPRETER_DESCRIPTION_OID: &str = "1.3.6.1.2.1.43.15.1.1.5.1";

/// Read community used for every query.
pub const COMMUNITY: &[u8] = b"public";

/// Upper bound on get-next steps per sub-tree; a misbehaving agent that
/// never leaves the sub-tree must not keep the probe alive forever.
#[cfg(feature = "snmp")]
const MAX_WALK_STEPS: usize = 64;

/// Whether this build can speak SNMP at all.
pub const fn snmp_available() -> bool {
    cfg!(feature = "snmp")
}

/// Probe that walks the device and interpreter description tables.
#[derive(Debug, Clone)]
pub struct SnmpProbe {
    port: u16,
    timeout: Duration,
}

impl SnmpProbe {
    /// `timeout` bounds each request; there are no retries.
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }
}

#[async_trait]
impl Probe for SnmpProbe {
    fn protocol(&self) -> Protocol {
        Protocol::Snmp
    }

    #[instrument(skip(self), fields(port = self.port))]
    async fn probe(&self, host: &str) -> ProbeResult {
        #[cfg(feature = "snmp")]
        {
            let target = crate::probe::authority(host, self.port);
            let timeout = self.timeout;
            let bindings = tokio::task::spawn_blocking(move || {
                walk::walk_subtrees(
                    &target,
                    timeout,
                    &[DEVICE_DESCRIPTION_OID, INTERPRETER_DESCRIPTION_OID],
                )
            })
            .await
            .map_err(|e| ProbeError::Transport(format!("SNMP worker failed: {e}")))??;

            debug!(count = bindings.len(), "SNMP walk complete");
            Ok(parse_bindings(&bindings))
        }

        #[cfg(not(feature = "snmp"))]
        {
            debug!(host, timeout = ?self.timeout, "SNMP support not compiled in");
            Err(ProbeError::DependencyUnavailable)
        }
    }
}

/// Derive a fingerprint from `(oid, value)` bindings in response order.
pub fn parse_bindings(bindings: &[(String, String)]) -> Fingerprint {
    let mut descriptions = Vec::new();
    let mut interpreters = Vec::new();

    for (oid, value) in bindings {
        if in_subtree(oid, DEVICE_DESCRIPTION_OID) {
            descriptions.push(value.as_str());
        }
        if in_subtree(oid, INTERPRETER_DESCRIPTION_OID) {
            interpreters.push(value.as_str());
        }
    }

    Fingerprint {
        model: descriptions.first().map(|s| s.to_string()).unwrap_or_default(),
        languages: interpreters.join(","),
    }
}

/// Whether dotted `oid` equals `root` or lies beneath it.
pub fn in_subtree(oid: &str, root: &str) -> bool {
    let oid = oid.trim_start_matches('.');
    oid == root
        || oid
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// Parse a dotted OID into its arcs.
pub fn parse_oid(dotted: &str) -> Result<Vec<u64>, ProbeError> {
    dotted
        .trim_start_matches('.')
        .split('.')
        .map(|arc| {
            arc.parse::<u64>()
                .map_err(|_| ProbeError::Protocol(format!("malformed OID '{dotted}'")))
        })
        .collect()
}

/// Name of an SNMPv1 error-status value (RFC 1157 §4.1.1).
pub fn error_status_name(status: u32) -> &'static str {
    match status {
        1 => "tooBig",
        2 => "noSuchName",
        3 => "badValue",
        4 => "readOnly",
        5 => "genErr",
        _ => "unknown error",
    }
}

#[cfg(feature = "snmp")]
mod walk {
    use std::time::Duration;

    use snmp2::{Oid, SyncSession, Value};
    use tracing::debug;

    use pdlscout_core::error::ProbeError;

    use super::{COMMUNITY, MAX_WALK_STEPS, error_status_name, in_subtree, parse_oid};

    /// SNMPv1 agents signal the end of a walk with noSuchName.
    const ERROR_STATUS_NO_SUCH_NAME: u32 = 2;

    /// Walk each root in turn, returning every binding found beneath it.
    pub(super) fn walk_subtrees(
        target: &str,
        timeout: Duration,
        roots: &[&str],
    ) -> Result<Vec<(String, String)>, ProbeError> {
        let mut session = SyncSession::new_v1(target, COMMUNITY, Some(timeout), 0)
            .map_err(|e| ProbeError::Transport(format!("cannot open SNMP session: {e}")))?;

        let mut bindings = Vec::new();
        for root in roots {
            walk_subtree(&mut session, root, &mut bindings)?;
        }
        Ok(bindings)
    }

    fn walk_subtree(
        session: &mut SyncSession,
        root: &str,
        out: &mut Vec<(String, String)>,
    ) -> Result<(), ProbeError> {
        let mut current = parse_oid(root)?;

        for _ in 0..MAX_WALK_STEPS {
            let oid = Oid::from(&current[..])
                .map_err(|e| ProbeError::Protocol(format!("cannot encode OID {root}: {e:?}")))?;
            let pdu = session
                .getnext(&oid)
                .map_err(|e| ProbeError::Transport(format!("SNMP request failed: {e}")))?;

            if pdu.error_status == ERROR_STATUS_NO_SUCH_NAME {
                break;
            }
            if pdu.error_status != 0 {
                return Err(ProbeError::Protocol(format!(
                    "SNMP error status {} ({})",
                    pdu.error_status,
                    error_status_name(pdu.error_status)
                )));
            }

            let Some((name, value)) = pdu.varbinds.into_iter().next() else {
                break;
            };
            let name = name.to_id_string();
            if !in_subtree(&name, root) {
                break;
            }
            let next = parse_oid(&name)?;
            if next <= current {
                debug!(oid = %name, "agent returned a non-increasing OID, stopping walk");
                break;
            }

            out.push((name, render_value(&value)));
            current = next;
        }
        Ok(())
    }

    fn render_value(value: &Value) -> String {
        match value {
            Value::OctetString(bytes) => String::from_utf8_lossy(bytes).trim().to_string(),
            Value::Integer(n) => n.to_string(),
            other => format!("{other:?}"),
        }
    }
}

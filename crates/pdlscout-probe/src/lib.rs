// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdlscout Probe — IPP, HTTP and SNMP fingerprinting probes, the plain-text
// model database, and the capability session that ties them together to
// decide whether a printer speaks PostScript, PJL or PCL.

pub mod database;
pub mod http;
pub mod ipp;
pub mod probe;
pub mod session;
pub mod snmp;

#[cfg(test)]
mod test_support;

pub use database::ModelDatabase;
pub use http::HttpProbe;
pub use ipp::IppProbe;
pub use probe::Probe;
pub use session::CapabilitySession;
pub use snmp::{SnmpProbe, snmp_available};

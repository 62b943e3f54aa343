// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability session configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PdlscoutError, Result};
use crate::types::Mode;

/// Default base timeout for a single probe, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default directory holding `<mode>.dat` model databases.
pub const DEFAULT_DB_DIR: &str = "db";

/// Ports each probe talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbePorts {
    /// IPP over HTTP (default 631).
    pub ipp: u16,
    /// Administrative web interface (default 80).
    pub http: u16,
    /// SNMP agent, UDP (default 161).
    pub snmp: u16,
}

impl Default for ProbePorts {
    fn default() -> Self {
        Self {
            ipp: 631,
            http: 80,
            snmp: 161,
        }
    }
}

/// Settings for one capability session against one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Host name or address of the printer.
    pub target: String,
    /// Language whose support is being verified.
    pub mode: Mode,
    /// Run the verification workflow, and abort when nothing is found.
    /// When unset, no probing happens at all.
    pub safe: bool,
    /// Base timeout per probe. IPP uses twice this value.
    pub timeout: Duration,
    /// Directory holding the model databases.
    pub db_dir: PathBuf,
    pub ports: ProbePorts,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            mode: Mode::Ps,
            safe: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            db_dir: PathBuf::from(DEFAULT_DB_DIR),
            ports: ProbePorts::default(),
        }
    }
}

impl SessionConfig {
    pub fn new(target: impl Into<String>, mode: Mode) -> Self {
        Self {
            target: target.into(),
            mode,
            ..Self::default()
        }
    }

    /// Reject configurations no probe could run with.
    pub fn validate(&self) -> Result<()> {
        if self.target.trim().is_empty() {
            return Err(PdlscoutError::Config("no target specified".into()));
        }
        if self.timeout.is_zero() {
            return Err(PdlscoutError::Config("timeout must be greater than zero".into()));
        }
        Ok(())
    }

    /// Timeout for the IPP probe; embedded IPP stacks answer slowly.
    pub fn ipp_timeout(&self) -> Duration {
        self.timeout * 2
    }
}

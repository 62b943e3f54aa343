// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for printer language fingerprinting.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PdlscoutError, ProbeError};
use crate::matching::contains_ignore_case;

/// Page-description language whose support is being verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// PostScript (and vendor clones such as BR-Script or KPDL).
    Ps,
    /// Printer Job Language.
    Pjl,
    /// Printer Command Language.
    Pcl,
}

impl Mode {
    /// All modes, in the order they are listed to users.
    pub const ALL: [Mode; 3] = [Mode::Ps, Mode::Pjl, Mode::Pcl];

    /// Short lowercase keyword, also the database file stem.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Ps => "ps",
            Self::Pjl => "pjl",
            Self::Pcl => "pcl",
        }
    }

    /// Aliases under which devices advertise this language.
    pub fn aliases(&self) -> LanguageAliasSet {
        let aliases: &'static [&'static str] = match self {
            Self::Ps => &["PS", "PostScript", "BR-Script", "KPDL"],
            Self::Pjl => &["PJL"],
            Self::Pcl => &["PCL"],
        };
        LanguageAliasSet { aliases }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Mode {
    type Err = PdlscoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ps" => Ok(Self::Ps),
            "pjl" => Ok(Self::Pjl),
            "pcl" => Ok(Self::Pcl),
            other => Err(PdlscoutError::UnknownMode(other.to_string())),
        }
    }
}

/// Ordered, immutable list of textual aliases for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageAliasSet {
    aliases: &'static [&'static str],
}

impl LanguageAliasSet {
    /// The aliases in preference order.
    pub fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }

    /// Name shown in the per-language summary line (the first alias).
    pub fn display_name(&self) -> &'static str {
        self.aliases.first().copied().unwrap_or_default()
    }

    /// Every alias contained in a device-reported language string.
    pub fn matching(&self, languages: &str) -> Vec<&'static str> {
        self.aliases
            .iter()
            .copied()
            .filter(|alias| contains_ignore_case(languages, alias))
            .collect()
    }
}

/// One line of a model database: a substring of a device's model string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelEntry(String);

impl ModelEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this entry identifies the given device model string.
    pub fn identifies(&self, model: &str) -> bool {
        contains_ignore_case(model, &self.0)
    }
}

impl fmt::Display for ModelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three protocols used to fingerprint a device, in probing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Ipp,
    Http,
    Snmp,
}

impl Protocol {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ipp => "IPP",
            Self::Http => "HTTP",
            Self::Snmp => "SNMP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a probe extracted from a device. Either field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Free-text model identity (IPP `MDL:`, HTML title, hrDeviceDescr).
    pub model: String,
    /// Comma-separated language list (IPP `CMD:`, prtInterpreterDescription).
    pub languages: String,
}

impl Fingerprint {
    pub fn new(model: impl Into<String>, languages: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            languages: languages.into(),
        }
    }
}

/// Result of running one protocol probe.
pub type ProbeResult = std::result::Result<Fingerprint, ProbeError>;

/// How a probe is reported to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The model string matched at least one database entry.
    Found(String),
    /// The probe completed but produced nothing the database recognises.
    NoData,
    /// The probe failed; carries the reason text.
    Failed(String),
}

/// Per-protocol line of a session report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub protocol: Protocol,
    pub outcome: ProbeOutcome,
}

/// One element of a session's accumulated support list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SupportSignal {
    /// A database entry contained in a device model string.
    Database(ModelEntry),
    /// A language alias contained in a device language string.
    LanguageAlias(String),
}

impl fmt::Display for SupportSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database(entry) => write!(f, "{entry}"),
            Self::LanguageAlias(alias) => f.write_str(alias),
        }
    }
}

/// Lifecycle of a capability session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Initialized,
    ProbingIpp,
    ProbingHttp,
    ProbingSnmp,
    Reporting,
    Continuing,
    Terminated,
}

/// Final decision handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Verification was not requested; nothing was probed.
    Skipped,
    /// Proceed with further operations against the device.
    Continue,
    /// Safe mode found no evidence of support; stop here.
    Abort,
}

/// Everything a session observed, in a serialisable form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub target: String,
    pub mode: Mode,
    /// Display name of the requested language (e.g. "PS").
    pub language: String,
    pub probes: Vec<ProbeReport>,
    pub support: Vec<SupportSignal>,
    /// Whether the requested language was found by any probe.
    pub language_supported: bool,
    pub verdict: Verdict,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for pdlscout.

use thiserror::Error;

/// Top-level error type for pdlscout operations that can fail outright.
///
/// Probe failures never surface here; they are carried as [`ProbeError`]
/// inside a probe outcome and aggregated by the capability session.
#[derive(Debug, Error)]
pub enum PdlscoutError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("unknown mode '{0}' (expected ps, pjl or pcl)")]
    UnknownMode(String),

    // -- Storage / persistence --
    #[error("model database error: {0}")]
    Storage(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why a single protocol probe produced no fingerprint.
///
/// A probe that completes but finds nothing is not an error; it yields an
/// empty [`Fingerprint`](crate::types::Fingerprint).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// Connection refused, timeout, TLS failure, truncated exchange.
    #[error("{0}")]
    Transport(String),

    /// The device answered but reported an error (e.g. SNMP error-status).
    #[error("{0}")]
    Protocol(String),

    /// The protocol client is not compiled into this build.
    #[error("SNMP support not installed")]
    DependencyUnavailable,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PdlscoutError>;

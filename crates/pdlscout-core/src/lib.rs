// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdlscout — Core types, configuration and error definitions shared across
// all crates.

pub mod config;
pub mod error;
pub mod matching;
pub mod types;

pub use config::{ProbePorts, SessionConfig};
pub use error::{PdlscoutError, ProbeError};
pub use matching::contains_ignore_case;
pub use types::*;

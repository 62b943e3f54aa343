// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Model database: one plain-text file per language mode, one known model
// substring per line.
//
// The files are append-only. Reads fail soft (an unreadable database is an
// empty one) and writes fail soft (a failed insert is reported as `false`),
// so a missing or read-only `db/` directory never stops a session.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use pdlscout_core::types::{Mode, ModelEntry};

/// Handle on the directory holding `<mode>.dat` files.
#[derive(Debug)]
pub struct ModelDatabase {
    dir: PathBuf,
    /// Serialises match-then-append so concurrent learners cannot insert
    /// the same model twice.
    write_lock: Mutex<()>,
}

impl ModelDatabase {
    /// Open the database rooted at `dir`. Nothing is read until queried.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the database file for `mode`.
    pub fn path(&self, mode: Mode) -> PathBuf {
        self.dir.join(format!("{}.dat", mode.keyword()))
    }

    /// All entries for `mode`, trimmed, blank lines dropped, file order kept.
    pub fn load(&self, mode: Mode) -> Vec<ModelEntry> {
        let path = self.path(mode);
        match fs::read_to_string(&path) {
            Ok(text) => {
                let entries = parse_entries(&text);
                debug!(path = %path.display(), count = entries.len(), "loaded model database");
                entries
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot open model database");
                Vec::new()
            }
        }
    }

    /// Entries of `mode` that identify `candidate`.
    pub fn matches(&self, mode: Mode, candidate: &str) -> Vec<ModelEntry> {
        if candidate.is_empty() {
            return Vec::new();
        }
        matching_entries(&self.load(mode), candidate)
    }

    /// Learn a new model string for `mode`.
    ///
    /// Inserts only when the trimmed candidate is non-empty and no existing
    /// entry already identifies it. Returns whether a line was appended.
    pub fn add(&self, mode: Mode, candidate: &str) -> bool {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return false;
        }

        let _guard = match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let existing = self.matches(mode, candidate);
        if !existing.is_empty() {
            debug!(%mode, candidate, matched = %existing[0], "model already known");
            return false;
        }

        let path = self.path(mode);
        match append_line(&path, candidate) {
            Ok(()) => {
                info!(%mode, candidate, path = %path.display(), "added model to database");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot write model database");
                false
            }
        }
    }
}

/// Parse the text of a database file into entries.
pub fn parse_entries(text: &str) -> Vec<ModelEntry> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ModelEntry::new)
        .collect()
}

/// Every entry of `entries` contained in `candidate`, ignoring case.
pub fn matching_entries(entries: &[ModelEntry], candidate: &str) -> Vec<ModelEntry> {
    entries
        .iter()
        .filter(|entry| entry.identifies(candidate))
        .cloned()
        .collect()
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Console feedback for capability sessions.

use colored::*;

use pdlscout_core::types::{ProbeOutcome, ProbeReport, SessionReport};

/// Column at which probe results start.
const PROBE_LABEL_WIDTH: usize = 34;

/// Width of the "<LANG> support: " field in the summary line.
const LANGUAGE_LABEL_WIDTH: usize = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Good,
    Bad,
    Warn,
}

/// Writes feedback lines to stdout.
pub struct Console {
    color: bool,
}

impl Console {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn probe(&self, report: &ProbeReport) {
        let (label, status, tone) = probe_line(report);
        println!("{label}{}", self.paint(&status, tone));
    }

    pub fn summary(&self, report: &SessionReport) {
        let (label, status, tone) = language_line(report);
        println!("{label}{}", self.paint(&status, tone));
    }

    pub fn notice(&self, text: &str) {
        println!("{}", self.paint(text, Tone::Warn));
    }

    fn paint(&self, text: &str, tone: Tone) -> String {
        if !self.color {
            return text.to_string();
        }
        match tone {
            Tone::Good => text.green().to_string(),
            Tone::Bad => text.red().to_string(),
            Tone::Warn => text.yellow().to_string(),
        }
    }
}

fn probe_line(report: &ProbeReport) -> (String, String, Tone) {
    let label = format!(
        "{:<width$}",
        format!("Checking for {} support:", report.protocol),
        width = PROBE_LABEL_WIDTH
    );
    let (status, tone) = match &report.outcome {
        ProbeOutcome::Found(model) => (format!("found [{model}]"), Tone::Good),
        ProbeOutcome::NoData => (
            "not found (check successful but no data)".to_string(),
            Tone::Bad,
        ),
        ProbeOutcome::Failed(reason) => (format!("not found ({reason})"), Tone::Bad),
    };
    (label, status, tone)
}

fn language_line(report: &SessionReport) -> (String, String, Tone) {
    let label = format!(
        "Checking for {:<width$}",
        format!("{} support: ", report.language),
        width = LANGUAGE_LABEL_WIDTH
    );
    if report.language_supported {
        (label, "found".to_string(), Tone::Good)
    } else {
        (label, "not found".to_string(), Tone::Warn)
    }
}

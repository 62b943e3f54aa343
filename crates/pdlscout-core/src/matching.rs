// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Case-insensitive substring containment.
//
// Both language-alias checks and model database lookups go through this one
// function so the two call sites cannot drift apart.

/// Whether `needle` occurs in `haystack`, ignoring case.
///
/// An empty needle or an empty haystack never matches.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() || haystack.is_empty() {
        return false;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

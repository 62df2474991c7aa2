//! Whitelist parsing.
//!
//! A whitelist is a plain text file of hosts that must never be banned: one
//! host per line, with `#` starting a comment line and blank lines ignored.
//! Parsing is separated from file reading so the format rules can be tested
//! without touching the filesystem; the blacklist engine decides what a read
//! failure means (it keeps running).
//!
//! Copyright (c) 2026 CIPS Corps. All rights reserved.

use crate::BansheeResult;
use std::collections::HashSet;
use std::path::Path;

/// Parse whitelist text into its set of hosts.
///
/// Lines are trimmed; empty lines and lines whose first non-blank character
/// is `#` are skipped. Hosts are kept verbatim and matched case-sensitively.
pub fn parse(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read and parse a whitelist file.
pub fn load(path: &Path) -> BansheeResult<HashSet<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse(&content))
}

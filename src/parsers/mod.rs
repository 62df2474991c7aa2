//! Offense source abstraction layer for Banshee.
//!
//! A parser turns some external source (log files, an imported blacklist)
//! into a stream of [`Offense`] records. The engine never learns where an
//! offense came from; the scanner never learns how a source is read.
//!
//! Copyright (c) 2026 CIPS Corps. All rights reserved.

pub mod blacklist_file;
pub mod regex_log;

use crate::{BansheeResult, Offense, ParserConfig};
use chrono::NaiveDate;

pub trait Parser {
    fn name(&self) -> &str;

    /// Scan the source, handing each offense to `sink` as it is found.
    /// Returns how many offenses were produced. Sources stream line by
    /// line; a source that cannot be opened or read is fatal to the scan,
    /// which leaves the backlog exactly as the previous run wrote it.
    fn scan(&self, sink: &mut dyn FnMut(Offense)) -> BansheeResult<u64>;
}

/// Build the configured parsers, in configuration order. `today` anchors
/// date repair and fallbacks for the whole run.
///
/// Patterns and date formats are validated here, so a bad config fails
/// before any file is touched rather than halfway through a scan.
pub fn build(configs: &[ParserConfig], today: NaiveDate) -> BansheeResult<Vec<Box<dyn Parser>>> {
    let mut parsers: Vec<Box<dyn Parser>> = Vec::with_capacity(configs.len());
    for config in configs {
        let parser: Box<dyn Parser> = match config {
            ParserConfig::Regex(cfg) => {
                Box::new(regex_log::RegexLogParser::with_today(cfg, today)?)
            }
            ParserConfig::Blacklist(cfg) => {
                Box::new(blacklist_file::BlacklistFileParser::new(cfg))
            }
        };
        log::info!("Registered parser: {}", parser.name());
        parsers.push(parser);
    }
    Ok(parsers)
}

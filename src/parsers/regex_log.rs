//! Regex log scanner.
//!
//! Pulls offenses out of plain-text log lines. Every configured pattern
//! must bind the named capture groups `date` and `host`; patterns are tried
//! in order on each line and the first match settles the line. The captured
//! date goes through the configured strftime format and then the date
//! repair policy. A date that still cannot be resolved is not a reason to
//! drop the offense: it counts as one hit today, with a warning.
//!
//! The logfile entry `-` reads standard input, so rotated logs can be piped
//! through `zcat` without touching the disk.
//!
//! Copyright (c) 2026 CIPS Corps. All rights reserved.

use crate::parsers::Parser;
use crate::{BansheeError, BansheeResult, DateAdjust, Offense, RegexParserConfig};
use chrono::format::{Item, Parsed, StrftimeItems};
use chrono::{Datelike, Days, Local, NaiveDate};
use log::{debug, warn};
use regex::Regex;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

pub struct RegexLogParser {
    name: String,
    logfiles: Vec<PathBuf>,
    date_format: String,
    date_adjust: DateAdjust,
    weight: i64,
    patterns: Vec<Regex>,
    today: NaiveDate,
}

impl RegexLogParser {
    /// Build a parser for a scan happening today.
    pub fn new(config: &RegexParserConfig) -> BansheeResult<Self> {
        Self::with_today(config, Local::now().date_naive())
    }

    /// Build a parser with an explicit "today", which anchors both the
    /// unparsable-date fallback and the assume-current-year policy.
    pub fn with_today(config: &RegexParserConfig, today: NaiveDate) -> BansheeResult<Self> {
        if config.patterns.is_empty() {
            return Err(BansheeError::Config(format!(
                "parser {}: no patterns configured",
                config.name
            )));
        }
        if StrftimeItems::new(&config.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(BansheeError::Config(format!(
                "parser {}: invalid date format {:?}",
                config.name, config.date_format
            )));
        }

        let mut patterns = Vec::with_capacity(config.patterns.len());
        for source in &config.patterns {
            let regex = Regex::new(source).map_err(|e| {
                BansheeError::Config(format!(
                    "parser {}: bad pattern {:?}: {}",
                    config.name, source, e
                ))
            })?;
            for group in ["date", "host"] {
                if !regex.capture_names().flatten().any(|name| name == group) {
                    return Err(BansheeError::Config(format!(
                        "parser {}: pattern {:?} lacks the named group {:?}",
                        config.name, source, group
                    )));
                }
            }
            patterns.push(regex);
        }

        Ok(Self {
            name: config.name.clone(),
            logfiles: config.logfiles.clone(),
            date_format: config.date_format.clone(),
            date_adjust: config.date_adjust,
            weight: config.weight,
            patterns,
            today,
        })
    }

    /// Lines are read as raw bytes and converted lossily: log files carry
    /// attacker-chosen strings (usernames, banners), and an undecodable
    /// byte in one line must not be able to stop the scan.
    fn scan_reader(
        &self,
        mut reader: impl BufRead,
        origin: &Path,
        sink: &mut dyn FnMut(Offense),
    ) -> BansheeResult<u64> {
        let mut produced = 0;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf).map_err(|e| {
                BansheeError::Parser(format!(
                    "{}: read error in {}: {}",
                    self.name,
                    origin.display(),
                    e
                ))
            })?;
            if read == 0 {
                break;
            }
            let mut end = buf.len();
            if end > 0 && buf[end - 1] == b'\n' {
                end -= 1;
                if end > 0 && buf[end - 1] == b'\r' {
                    end -= 1;
                }
            }
            let line = String::from_utf8_lossy(&buf[..end]);
            if let Some(offense) = self.match_line(&line) {
                sink(offense);
                produced += 1;
            }
        }
        Ok(produced)
    }

    /// Try each pattern in order; the first match settles the line.
    fn match_line(&self, line: &str) -> Option<Offense> {
        for pattern in &self.patterns {
            if let Some(caps) = pattern.captures(line) {
                let host = match caps.name("host") {
                    Some(m) => m.as_str(),
                    // The group exists in the pattern but sat in an
                    // unmatched branch of it; not a usable hit.
                    None => continue,
                };
                let raw_date = caps.name("date").map_or("", |m| m.as_str());
                let date = match self.parse_date(raw_date) {
                    Some(date) => date,
                    None => {
                        warn!(
                            "Could not parse {:?} as {:?}, assuming one hit today for {}.",
                            raw_date, self.date_format, host
                        );
                        self.today
                    }
                };
                return Some(Offense::weighted(date, host, self.weight));
            }
        }
        None
    }

    /// Parse a captured date and apply the repair policy. `None` means the
    /// date cannot be resolved under the policy; the caller falls back to
    /// today.
    fn parse_date(&self, raw: &str) -> Option<NaiveDate> {
        let mut parsed = Parsed::new();
        chrono::format::parse(&mut parsed, raw, StrftimeItems::new(&self.date_format)).ok()?;

        match self.date_adjust {
            DateAdjust::None => parsed.to_naive_date().ok(),
            DateAdjust::AssumeCurrentYear => {
                if parsed.year.is_some() {
                    parsed.to_naive_date().ok()
                } else {
                    resolve_yearless(self.today, parsed.month?, parsed.day?)
                }
            }
            DateAdjust::OffsetDays(offset) => {
                let date = parsed.to_naive_date().ok()?;
                if offset >= 0 {
                    date.checked_add_days(Days::new(offset as u64))
                } else {
                    date.checked_sub_days(Days::new(offset.unsigned_abs()))
                }
            }
        }
    }
}

impl Parser for RegexLogParser {
    fn name(&self) -> &str {
        &self.name
    }

    fn scan(&self, sink: &mut dyn FnMut(Offense)) -> BansheeResult<u64> {
        let mut produced = 0;
        for logfile in &self.logfiles {
            debug!("{} parsing {}.", self.name, logfile.display());
            if logfile.as_os_str() == "-" {
                let stdin = io::stdin();
                produced += self.scan_reader(stdin.lock(), Path::new("<stdin>"), sink)?;
            } else {
                let file = std::fs::File::open(logfile).map_err(|e| {
                    BansheeError::Parser(format!(
                        "{}: cannot open the logfile {}: {}",
                        self.name,
                        logfile.display(),
                        e
                    ))
                })?;
                produced += self.scan_reader(BufReader::new(file), logfile, sink)?;
            }
            debug!("{} done parsing {}.", self.name, logfile.display());
        }
        Ok(produced)
    }
}

/// Resolve a month and day with no year: this year, unless that lands in
/// the future, then last year. Syslog keeps no year, so a December entry
/// read in January must not come out eleven months ahead. Feb 29 outside a
/// leap year takes the last-year branch too, and gives up if that year is
/// no better.
fn resolve_yearless(today: NaiveDate, month: u32, day: u32) -> Option<NaiveDate> {
    match NaiveDate::from_ymd_opt(today.year(), month, day) {
        Some(date) if date <= today => Some(date),
        _ => NaiveDate::from_ymd_opt(today.year() - 1, month, day),
    }
}

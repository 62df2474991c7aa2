//! Flat-file blacklist import.
//!
//! Reads an externally maintained blacklist, one `host[,date[,weight]]` row
//! per line, and turns every row into an offense. A row without a date gets
//! the configured ban date (far future by default, a standing ban); a row
//! without a weight gets the configured weight (`i64::MAX` by default, an
//! instant threshold hit at any tuning).

use crate::blacklist::BACKLOG_DATE_FORMAT;
use crate::parsers::Parser;
use crate::{BansheeError, BansheeResult, BlacklistFileConfig, Offense};
use chrono::NaiveDate;
use log::{debug, error};
use std::path::PathBuf;

pub struct BlacklistFileParser {
    name: String,
    path: PathBuf,
    ban_date: NaiveDate,
    weight: i64,
}

impl BlacklistFileParser {
    pub fn new(config: &BlacklistFileConfig) -> Self {
        Self {
            name: config.name.clone(),
            path: config.path.clone(),
            ban_date: config.ban_date.unwrap_or(NaiveDate::MAX),
            weight: config.weight.unwrap_or(i64::MAX),
        }
    }

    /// Parse one row. Fields are trimmed; blacklists get edited by hand.
    /// `None` marks a malformed row: empty host, bad date, or bad weight.
    fn parse_row(&self, line: &str) -> Option<Offense> {
        let mut fields = line.splitn(3, ',');
        let host = fields.next()?.trim();
        if host.is_empty() {
            return None;
        }
        let date = match fields.next() {
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), BACKLOG_DATE_FORMAT).ok()?,
            None => self.ban_date,
        };
        let weight = match fields.next() {
            Some(raw) => raw.trim().parse::<i64>().ok()?,
            None => self.weight,
        };
        Some(Offense::weighted(date, host, weight))
    }
}

impl Parser for BlacklistFileParser {
    fn name(&self) -> &str {
        &self.name
    }

    fn scan(&self, sink: &mut dyn FnMut(Offense)) -> BansheeResult<u64> {
        debug!("{} reading {}.", self.name, self.path.display());
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            BansheeError::Parser(format!(
                "{}: cannot open the blacklist {}: {}",
                self.name,
                self.path.display(),
                e
            ))
        })?;

        let mut produced = 0;
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match self.parse_row(line) {
                Some(offense) => {
                    sink(offense);
                    produced += 1;
                }
                None => {
                    error!(
                        "Blacklist {} malformed at line {}, skipping.",
                        self.path.display(),
                        index + 1
                    );
                }
            }
        }
        debug!(
            "{} read {} hosts from {}.",
            self.name,
            produced,
            self.path.display()
        );
        Ok(produced)
    }
}

//! # Banshee - Core Library
//!
//! Batch brute-force detector for network-facing login daemons.
//!
//! Banshee scans log files for repeated failed authentication attempts,
//! accumulates a weighted offense count per host, merges the result with the
//! ban backlog persisted by earlier runs, and hands every host whose ban is
//! still active to the configured printers. It is built for cron: one
//! process, one pass over the logs, then exit.
//!
//! ## Design Philosophy
//! - **Scan, decide, emit. Nothing else.** No daemon, no sockets, no timers.
//! - The backlog file is the only state carried across runs: one
//!   `host,YYYY-MM-DD` row per still-active ban, rewritten whole every run.
//! - Parsers and printers are plugins behind small traits; the engine never
//!   sees a log format or an output format, only offenses and bans.
//! - A corrupt backlog degrades the run (and the exit status); it never
//!   aborts it.

pub mod blacklist;
pub mod parsers;
pub mod printers;
pub mod scanner;
pub mod whitelist;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Unified error type for Banshee.
#[derive(Error, Debug)]
pub enum BansheeError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The single-use engine contract was violated (`done()` twice, or bans
    /// requested before `done()`). Always a caller bug, never an I/O state.
    #[error("Invalid engine state: {0}")]
    InvalidState(&'static str),

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("Printer error: {0}")]
    Printer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

pub type BansheeResult<T> = Result<T, BansheeError>;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Top-level configuration for Banshee.
///
/// Loaded from `/etc/banshee.toml` or a path supplied via CLI flag. Parsers
/// and printers are arrays of tables; each table's `type` key selects the
/// concrete implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BansheeConfig {
    /// The blacklist engine: backlog path, whitelist, ban tuning knobs.
    pub blacklist: BlacklistConfig,

    /// Offense sources, scanned in order.
    #[serde(default, rename = "parser")]
    pub parsers: Vec<ParserConfig>,

    /// Ban-list sinks. Every printer receives every ban record.
    #[serde(default, rename = "printer")]
    pub printers: Vec<PrinterConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistConfig {
    /// Path of the ban backlog, the only state kept between runs.
    pub backlog: PathBuf,

    /// Optional whitelist file: one host per line, `#` comments.
    /// Whitelisted hosts are never banned, not even retroactively.
    pub whitelist: Option<PathBuf>,

    /// How many days a ban lasts, counted from the host's last offense.
    #[serde(default = "default_bantime")]
    pub bantime: i64,

    /// Accumulated offense weight at which a host gets banned.
    #[serde(default = "default_threshold")]
    pub threshold: i64,
}

fn default_bantime() -> i64 {
    7
}

fn default_threshold() -> i64 {
    10
}

/// One configured offense source. The `type` key picks the implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParserConfig {
    /// Regex line scanner over one or more log files.
    Regex(RegexParserConfig),

    /// Flat-file import of an externally maintained blacklist.
    Blacklist(BlacklistFileConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegexParserConfig {
    /// Name used in log messages.
    pub name: String,

    /// Files to scan; the entry `-` reads standard input once.
    pub logfiles: Vec<PathBuf>,

    /// strftime-style format for the `date` capture group.
    pub date_format: String,

    /// Post-parse date repair policy. See [`DateAdjust`].
    #[serde(default)]
    pub date_adjust: DateAdjust,

    /// Weight added per matched line.
    #[serde(default = "default_hit_weight")]
    pub weight: i64,

    /// Patterns tried in order per line; first match wins. Every pattern
    /// must define the named capture groups `date` and `host`.
    pub patterns: Vec<String>,
}

fn default_hit_weight() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistFileConfig {
    /// Name used in log messages.
    pub name: String,

    /// The blacklist file: CSV rows `host[,date[,weight]]`.
    pub path: PathBuf,

    /// Ban date assumed for rows that omit one. Defaults to the far
    /// future, which keeps the host banned on every run.
    pub ban_date: Option<NaiveDate>,

    /// Weight assumed for rows that omit one. Defaults to `i64::MAX`,
    /// which bans the host at any threshold.
    pub weight: Option<i64>,
}

/// How a regex parser repairs dates after parsing.
///
/// Ancestors of this tool accepted an arbitrary expression evaluated per
/// record here. That is a code-execution hole, so the policy is now a
/// closed set of variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateAdjust {
    /// Use the parsed date as-is. Year-less formats cannot produce a date
    /// under this policy and fall back to "one hit today".
    #[default]
    None,

    /// Fill in the year for formats that lack one (classic syslog): the
    /// current year, or the previous one if that would put the date in
    /// the future.
    AssumeCurrentYear,

    /// Shift every parsed date by a fixed number of days.
    OffsetDays(i64),
}

/// One configured ban-list sink. The `type` key picks the implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrinterConfig {
    /// One host per record, no expiry. Fit for `hosts.deny` includes.
    Simple(SimpleListConfig),

    /// Template-formatted record with `{host}` and `{until}` placeholders.
    Formatted(FormattedListConfig),

    /// One JSON object per record, one record per line.
    Json(JsonListConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleListConfig {
    /// Name used in log messages.
    pub name: String,

    /// Output file, or `-` for standard output.
    pub destination: PathBuf,

    /// Written after every record. TOML string escapes (`"\n"`, `" "`)
    /// cover separators that are awkward to type literally.
    #[serde(default = "default_terminator")]
    pub terminator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattedListConfig {
    /// Name used in log messages.
    pub name: String,

    /// Output file, or `-` for standard output.
    pub destination: PathBuf,

    /// Per-record template. `{host}` and `{until}` are substituted;
    /// everything else passes through unchanged.
    #[serde(default = "default_format")]
    pub format: String,

    /// Written after every record.
    #[serde(default = "default_terminator")]
    pub terminator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonListConfig {
    /// Name used in log messages.
    pub name: String,

    /// Output file, or `-` for standard output.
    pub destination: PathBuf,
}

fn default_terminator() -> String {
    "\n".to_string()
}

fn default_format() -> String {
    "{host}".to_string()
}

impl Default for BansheeConfig {
    fn default() -> Self {
        Self {
            blacklist: BlacklistConfig {
                backlog: PathBuf::from("/var/lib/banshee/backlog.csv"),
                whitelist: Some(PathBuf::from("/etc/banshee.whitelist")),
                bantime: default_bantime(),
                threshold: default_threshold(),
            },
            parsers: vec![ParserConfig::Regex(RegexParserConfig {
                name: "sshd".to_string(),
                logfiles: vec![PathBuf::from("/var/log/auth.log")],
                date_format: "%b %e %H:%M:%S".to_string(),
                date_adjust: DateAdjust::AssumeCurrentYear,
                weight: default_hit_weight(),
                patterns: vec![
                    r"^(?P<date>\w{3}\s+\d{1,2} \d{2}:\d{2}:\d{2}).*sshd\[\d+\]: Failed password for (?:invalid user )?\S+ from (?P<host>\S+) port \d+"
                        .to_string(),
                    r"^(?P<date>\w{3}\s+\d{1,2} \d{2}:\d{2}:\d{2}).*sshd\[\d+\]: Invalid user \S+ from (?P<host>\S+)"
                        .to_string(),
                ],
            })],
            printers: vec![PrinterConfig::Simple(SimpleListConfig {
                name: "stdout".to_string(),
                destination: PathBuf::from("-"),
                terminator: default_terminator(),
            })],
        }
    }
}

impl BansheeConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> BansheeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BansheeConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Write the default configuration to a TOML file.
    pub fn write_default(path: &std::path::Path) -> BansheeResult<()> {
        let config = Self::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| BansheeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Core Types
// ---------------------------------------------------------------------------

/// One observed ban-worthy event: a host did something suspicious on a date.
///
/// This is the atomic unit of observation. Parsers produce these; the
/// blacklist engine consumes them. The host is an opaque, case-sensitive
/// identifier (an IP or a hostname in practice) and is never interpreted.
/// Weight 1 is one ordinary failed login; 0 means "seen, but not held
/// against the host"; a negative weight drains accumulated suspicion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offense {
    /// Calendar day of the event. No time-of-day component anywhere.
    pub date: NaiveDate,

    /// Who did it.
    pub host: String,

    /// How much it counts toward the ban threshold.
    pub weight: i64,
}

impl Offense {
    /// An offense with the default weight of 1.
    pub fn new(date: NaiveDate, host: impl Into<String>) -> Self {
        Self {
            date,
            host: host.into(),
            weight: 1,
        }
    }

    /// An offense with an explicit weight.
    pub fn weighted(date: NaiveDate, host: impl Into<String>, weight: i64) -> Self {
        Self {
            date,
            host: host.into(),
            weight,
        }
    }
}

/// One currently-active ban, as handed to the printers and persisted to
/// the backlog: the host and the day its ban runs out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanRecord {
    pub host: String,
    pub until: NaiveDate,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

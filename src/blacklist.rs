//! The blacklist engine.
//!
//! [`Blacklist`] is the decision core of Banshee. Parsers feed it offenses
//! via [`record`](Blacklist::record); a single call to
//! [`done`](Blacklist::done) then merges the persisted ban backlog into the
//! live counts, drops whitelisted hosts, decides who is banned, and rewrites
//! the backlog so the next run starts from exactly the still-active bans.
//! After `done()`, [`bans`](Blacklist::bans) exposes the result for the
//! printers.
//!
//! The merge resurrects every backlogged host at the ban threshold with an
//! effective last-offense date of `until - bantime`, so an old ban expires
//! on schedule unless fresh offenses push its date forward. Whitelisting is
//! retroactive: a host added to the whitelist after it was banned is purged
//! from the backlog on the next run.
//!
//! The backlog is rewritten via a temporary file in the same directory and
//! an atomic rename; a crashed run leaves the previous backlog intact. A
//! backlog with a malformed row is set aside under a `.corrupt` suffix, the
//! rows before the damage are kept, and the run carries on degraded.

use crate::{whitelist, BanRecord, BansheeError, BansheeResult, BlacklistConfig, Offense};
use chrono::{Days, Local, NaiveDate};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Date format used in backlog rows.
pub const BACKLOG_DATE_FORMAT: &str = "%Y-%m-%d";

/// Accumulated standing of one host within a run.
#[derive(Debug, Clone)]
struct HostRecord {
    /// Summed offense weights. Saturates instead of wrapping.
    count: i64,

    /// Most recent offense date seen for this host.
    last_seen: NaiveDate,
}

/// The single-use ban engine. See the module docs for the lifecycle.
///
/// `bans` doubles as the one-shot marker: `None` until [`done`](Self::done)
/// has run, `Some` afterwards. Recording after `done()` is not rejected,
/// but the late offenses go nowhere useful; the flag only hard-stops a
/// second `done()` and an early [`bans`](Self::bans).
pub struct Blacklist {
    backlog_path: PathBuf,
    bantime: i64,
    threshold: i64,
    today: NaiveDate,
    ignores: HashSet<String>,
    hits: HashMap<String, HostRecord>,
    backlog_recovered: bool,
    bans: Option<Vec<BanRecord>>,
}

impl Blacklist {
    /// Build an engine for a scan happening today.
    pub fn new(config: &BlacklistConfig) -> BansheeResult<Self> {
        Self::with_today(config, Local::now().date_naive())
    }

    /// Build an engine with an explicit "today". Used by tests and useful
    /// for replaying old logs.
    ///
    /// An unreadable whitelist is a warning, not a failure: the engine
    /// continues with an empty one rather than silently banning nobody.
    pub fn with_today(config: &BlacklistConfig, today: NaiveDate) -> BansheeResult<Self> {
        if config.bantime < 0 {
            return Err(BansheeError::Config(format!(
                "bantime must be non-negative, got {}",
                config.bantime
            )));
        }
        if config.threshold < 0 {
            return Err(BansheeError::Config(format!(
                "threshold must be non-negative, got {}",
                config.threshold
            )));
        }

        let ignores = match &config.whitelist {
            Some(path) => match whitelist::load(path) {
                Ok(hosts) => hosts,
                Err(e) => {
                    warn!(
                        "Unable to open the whitelist {} ({}), continuing.",
                        path.display(),
                        e
                    );
                    HashSet::new()
                }
            },
            None => HashSet::new(),
        };

        Ok(Self {
            backlog_path: config.backlog.clone(),
            bantime: config.bantime,
            threshold: config.threshold,
            today,
            ignores,
            hits: HashMap::new(),
            backlog_recovered: false,
            bans: None,
        })
    }

    /// Record one offense against its host.
    pub fn record(&mut self, offense: Offense) {
        let Offense { date, host, weight } = offense;
        let entry = self.hits.entry(host).or_insert(HostRecord {
            count: 0,
            last_seen: date,
        });
        entry.count = entry.count.saturating_add(weight);
        if date > entry.last_seen {
            entry.last_seen = date;
        }
    }

    /// Finish the run: merge the old backlog, purge whitelisted hosts,
    /// decide the bans, and rewrite the backlog.
    ///
    /// A host is banned when its count has reached the threshold and its
    /// ban (last offense plus bantime) runs out strictly later than today.
    /// Calling this twice is an invalid-state error.
    pub fn done(&mut self) -> BansheeResult<()> {
        if self.bans.is_some() {
            return Err(BansheeError::InvalidState("done() called twice"));
        }

        self.read_old_backlog()?;

        let ignores = &self.ignores;
        self.hits.retain(|host, _| !ignores.contains(host));

        let mut bans = Vec::new();
        for (host, record) in &self.hits {
            if record.count < self.threshold {
                continue;
            }
            let until = record
                .last_seen
                .checked_add_days(Days::new(self.bantime as u64))
                .unwrap_or(NaiveDate::MAX);
            if until > self.today {
                bans.push(BanRecord {
                    host: host.clone(),
                    until,
                });
            }
        }
        bans.sort_by(|a, b| a.host.cmp(&b.host));

        for ban in &bans {
            info!(
                "Banning {} until {}.",
                ban.host,
                ban.until.format(BACKLOG_DATE_FORMAT)
            );
        }

        self.write_backlog(&bans)?;
        self.bans = Some(bans);
        Ok(())
    }

    /// The bans decided by [`done`](Self::done), sorted by host.
    pub fn bans(&self) -> BansheeResult<&[BanRecord]> {
        self.bans
            .as_deref()
            .ok_or(BansheeError::InvalidState("bans() called before done()"))
    }

    /// True if this run found a corrupt backlog and set it aside.
    pub fn backlog_recovered(&self) -> bool {
        self.backlog_recovered
    }

    /// Merge the previous run's backlog into the live counts.
    ///
    /// A missing file means a fresh start. A file that exists but cannot
    /// be read is set aside and the run continues from empty. A malformed
    /// row stops the read: the rows before it are kept, the file is set
    /// aside, and the run continues.
    fn read_old_backlog(&mut self) -> BansheeResult<()> {
        let content = match fs::read_to_string(&self.backlog_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(
                    "No backlog at {}, starting fresh.",
                    self.backlog_path.display()
                );
                return Ok(());
            }
            Err(e) => {
                warn!(
                    "Unable to read the backlog {} ({}), continuing.",
                    self.backlog_path.display(),
                    e
                );
                return self.set_aside_backlog();
            }
        };

        let mut merged = 0usize;
        let mut corrupt_at = None;
        for (index, line) in content.lines().enumerate() {
            match parse_backlog_row(line) {
                Some((host, until)) => {
                    self.merge_backlog_row(host, until);
                    merged += 1;
                }
                None => {
                    corrupt_at = Some(index + 1);
                    break;
                }
            }
        }
        debug!(
            "Merged {} backlog rows from {}.",
            merged,
            self.backlog_path.display()
        );

        if let Some(lineno) = corrupt_at {
            warn!(
                "Corrupt backlog (line {} of {}), continuing without reading the rest.",
                lineno,
                self.backlog_path.display()
            );
            self.set_aside_backlog()?;
        }
        Ok(())
    }

    /// Preserve a damaged backlog for the operator instead of silently
    /// overwriting it. Flags the run as degraded.
    fn set_aside_backlog(&mut self) -> BansheeResult<()> {
        self.backlog_recovered = true;
        let aside = corrupt_aside_path(&self.backlog_path);
        info!("Saving the old backlog as {}.", aside.display());
        fs::rename(&self.backlog_path, &aside)?;
        Ok(())
    }

    /// An old ban comes back as "threshold hits, last seen `until` minus
    /// bantime", so it keeps its expiry unless new offenses extend it. The
    /// threshold floor means a backlogged ban survives even a run full of
    /// negative-weight offenses for that host.
    fn merge_backlog_row(&mut self, host: String, until: NaiveDate) {
        let effective = until
            .checked_sub_days(Days::new(self.bantime as u64))
            .unwrap_or(NaiveDate::MIN);
        let entry = self.hits.entry(host).or_insert(HostRecord {
            count: 0,
            last_seen: NaiveDate::MIN,
        });
        entry.count = entry.count.max(self.threshold);
        if effective > entry.last_seen {
            entry.last_seen = effective;
        }
    }

    /// Rewrite the backlog with exactly the active bans, atomically.
    fn write_backlog(&self, bans: &[BanRecord]) -> BansheeResult<()> {
        let mut content = String::new();
        for ban in bans {
            content.push_str(&format!(
                "{},{}\n",
                ban.host,
                ban.until.format(BACKLOG_DATE_FORMAT)
            ));
        }

        if let Some(parent) = self.backlog_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.backlog_path.with_extension("tmp");
        fs::write(&tmp, &content)?;
        fs::rename(&tmp, &self.backlog_path)?;
        Ok(())
    }
}

/// Parse one backlog row, `host,YYYY-MM-DD`. Returns `None` on any damage:
/// no comma, an empty host, or an unparsable date.
fn parse_backlog_row(line: &str) -> Option<(String, NaiveDate)> {
    let (host, date) = line.split_once(',')?;
    if host.is_empty() {
        return None;
    }
    let until = NaiveDate::parse_from_str(date, BACKLOG_DATE_FORMAT).ok()?;
    Some((host.to_string(), until))
}

fn corrupt_aside_path(path: &Path) -> PathBuf {
    let mut aside = path.as_os_str().to_os_string();
    aside.push(".corrupt");
    PathBuf::from(aside)
}

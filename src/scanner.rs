//! The scan orchestrator.
//!
//! One [`Scanner`] is one complete run: build the engine and the plugins
//! from configuration, drain every parser into the engine, finalize, then
//! drive every ban record through every printer and close them all. The
//! [`ScanReport`] at the end carries what the exit status needs to know.
//!
//! The whole run shares a single "today" snapshot, so a scan straddling
//! midnight cannot date an offense on one day and judge its expiry on
//! another.

use crate::blacklist::Blacklist;
use crate::parsers::{self, Parser};
use crate::printers::{self, Printer};
use crate::{BansheeConfig, BansheeResult};
use chrono::{Local, NaiveDate};
use log::{debug, error, info, warn};

pub struct Scanner {
    blacklist: Blacklist,
    parsers: Vec<Box<dyn Parser>>,
    printers: Vec<Box<dyn Printer>>,
}

/// What a finished run looked like, for logging and the exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    /// Offenses recorded across all parsers.
    pub offenses: u64,

    /// Hosts banned at the end of the run.
    pub bans: usize,

    /// Printers that failed an emit or their close.
    pub printer_failures: usize,

    /// True when a damaged backlog was set aside during the run.
    pub backlog_recovered: bool,
}

impl ScanReport {
    /// The run finished, but something the operator should know about
    /// went wrong along the way. Maps to a non-zero exit status.
    pub fn degraded(&self) -> bool {
        self.printer_failures > 0 || self.backlog_recovered
    }
}

impl Scanner {
    /// Build a scanner for a run happening today.
    pub fn from_config(config: &BansheeConfig) -> BansheeResult<Self> {
        Self::with_today(config, Local::now().date_naive())
    }

    /// Build a scanner with an explicit "today". Used by tests and useful
    /// for replaying old logs.
    pub fn with_today(config: &BansheeConfig, today: NaiveDate) -> BansheeResult<Self> {
        let scanner = Self::from_parts(
            Blacklist::with_today(&config.blacklist, today)?,
            parsers::build(&config.parsers, today)?,
            printers::build(&config.printers)?,
        );
        if scanner.printers.is_empty() {
            warn!("No printers configured; bans will only reach the backlog.");
        }
        Ok(scanner)
    }

    /// Assemble a scanner from already-built parts. [`from_config`] is the
    /// normal path; this one serves callers that wire up their own plugins.
    ///
    /// [`from_config`]: Self::from_config
    pub fn from_parts(
        blacklist: Blacklist,
        parsers: Vec<Box<dyn Parser>>,
        printers: Vec<Box<dyn Printer>>,
    ) -> Self {
        debug!(
            "Scanner ready: {} parsers, {} printers.",
            parsers.len(),
            printers.len()
        );
        Self {
            blacklist,
            parsers,
            printers,
        }
    }

    /// Run the scan to completion. Consumes the scanner; one instance is
    /// one run.
    ///
    /// A printer that fails an emit is logged and dropped for the rest of
    /// the run; the others keep receiving records, and every printer gets
    /// its `close()`. Failures only reach the report, never abort the run.
    pub fn run(mut self) -> BansheeResult<ScanReport> {
        let mut offenses = 0u64;
        for parser in &self.parsers {
            let blacklist = &mut self.blacklist;
            offenses += parser.scan(&mut |offense| blacklist.record(offense))?;
        }
        debug!(
            "Recorded {} offenses from {} parsers.",
            offenses,
            self.parsers.len()
        );

        self.blacklist.done()?;

        let mut failed = vec![false; self.printers.len()];
        for ban in self.blacklist.bans()? {
            for (printer, failed) in self.printers.iter_mut().zip(failed.iter_mut()) {
                if *failed {
                    continue;
                }
                if let Err(e) = printer.emit(ban) {
                    error!(
                        "Printer {} failed ({}), dropping it for this run.",
                        printer.name(),
                        e
                    );
                    *failed = true;
                }
            }
        }
        for (printer, failed) in self.printers.iter_mut().zip(failed.iter_mut()) {
            if let Err(e) = printer.close() {
                error!("Printer {} failed to close ({}).", printer.name(), e);
                *failed = true;
            }
        }

        let report = ScanReport {
            offenses,
            bans: self.blacklist.bans()?.len(),
            printer_failures: failed.iter().filter(|f| **f).count(),
            backlog_recovered: self.blacklist.backlog_recovered(),
        };
        info!(
            "Scan finished: {} offenses, {} hosts banned, {} printer failures.",
            report.offenses, report.bans, report.printer_failures
        );
        Ok(report)
    }
}

//! Ban-list sink abstraction layer for Banshee.
//!
//! A printer writes the final ban list somewhere: a plain file that
//! `hosts.deny` includes, standard output for a pipeline, a JSON feed for
//! another tool. Printers are built before any scanning starts, so an
//! unopenable destination fails the run early; once the run is emitting,
//! one broken printer only costs its own output, never the others'.
//!
//! Copyright (c) 2026 CIPS Corps. All rights reserved.

pub mod formatted_list;
pub mod json_list;
pub mod simple_list;

use crate::{BanRecord, BansheeError, BansheeResult, PrinterConfig};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

pub trait Printer {
    fn name(&self) -> &str;

    /// Write one ban record. A failure here is reported and isolated to
    /// this printer; the scanner keeps feeding the others.
    fn emit(&mut self, ban: &BanRecord) -> BansheeResult<()>;

    /// Flush and release the output. Called exactly once, after all
    /// emissions, failed printers included.
    fn close(&mut self) -> BansheeResult<()>;
}

/// Where a printer writes. `-` selects standard output.
///
/// Files are truncated on open: a run that ends with zero bans must leave
/// an empty list behind, not last week's.
pub enum Destination {
    Stdout(io::Stdout),
    File(fs::File),
}

impl Destination {
    pub fn open(path: &Path) -> BansheeResult<Self> {
        if path.as_os_str() == "-" {
            Ok(Destination::Stdout(io::stdout()))
        } else {
            let file = fs::File::create(path).map_err(|e| {
                BansheeError::Printer(format!(
                    "cannot open the ban-list destination {}: {}",
                    path.display(),
                    e
                ))
            })?;
            Ok(Destination::File(file))
        }
    }

    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        match self {
            Destination::Stdout(out) => out.write_all(s.as_bytes()),
            Destination::File(file) => file.write_all(s.as_bytes()),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match self {
            Destination::Stdout(out) => out.flush(),
            Destination::File(file) => file.flush(),
        }
    }
}

/// Build the configured printers, in configuration order.
pub fn build(configs: &[PrinterConfig]) -> BansheeResult<Vec<Box<dyn Printer>>> {
    let mut printers: Vec<Box<dyn Printer>> = Vec::with_capacity(configs.len());
    for config in configs {
        let printer: Box<dyn Printer> = match config {
            PrinterConfig::Simple(cfg) => Box::new(simple_list::SimpleListPrinter::new(cfg)?),
            PrinterConfig::Formatted(cfg) => {
                Box::new(formatted_list::FormattedListPrinter::new(cfg)?)
            }
            PrinterConfig::Json(cfg) => Box::new(json_list::JsonListPrinter::new(cfg)?),
        };
        log::info!("Registered printer: {}", printer.name());
        printers.push(printer);
    }
    Ok(printers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FormattedListConfig, JsonListConfig, SimpleListConfig};
    use std::path::PathBuf;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("banshee_printers_{}", name));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create test dir");
        dir
    }

    #[test]
    fn test_build_dispatches_by_config_type() {
        let dir = test_dir("dispatch");
        let configs = vec![
            PrinterConfig::Simple(SimpleListConfig {
                name: "deny".to_string(),
                destination: dir.join("deny"),
                terminator: "\n".to_string(),
            }),
            PrinterConfig::Formatted(FormattedListConfig {
                name: "report".to_string(),
                destination: dir.join("report"),
                format: "{host} until {until}".to_string(),
                terminator: "\n".to_string(),
            }),
            PrinterConfig::Json(JsonListConfig {
                name: "feed".to_string(),
                destination: dir.join("feed"),
            }),
        ];
        let printers = build(&configs).expect("all printers should build");
        let names: Vec<&str> = printers.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["deny", "report", "feed"]);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_opening_a_destination_truncates_it() {
        let dir = test_dir("truncate");
        let path = dir.join("deny");
        fs::write(&path, "stale.example\n").unwrap();

        let _destination = Destination::open(&path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "",
            "a zero-ban run must clear last run's list"
        );
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unopenable_destination_fails_the_build() {
        let dir = test_dir("unopenable");
        let configs = vec![PrinterConfig::Simple(SimpleListConfig {
            name: "bad".to_string(),
            // A directory cannot be opened for writing.
            destination: dir.clone(),
            terminator: "\n".to_string(),
        })];
        match build(&configs) {
            Err(BansheeError::Printer(msg)) => {
                assert!(
                    msg.contains(&dir.display().to_string()),
                    "error should name the destination: {}",
                    msg
                )
            }
            other => panic!("expected Printer error, got {:?}", other.map(|p| p.len())),
        }
        let _ = fs::remove_dir_all(&dir);
    }
}

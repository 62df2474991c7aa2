//! One host per record, nothing else.
//!
//! The output can be included by `/etc/hosts.deny` or fed to Squid. The
//! terminator between records is configurable; TOML string escapes make a
//! bare space or a NUL byte as easy to write as a newline.

use crate::printers::{Destination, Printer};
use crate::{BanRecord, BansheeError, BansheeResult, SimpleListConfig};

pub struct SimpleListPrinter {
    name: String,
    destination: Destination,
    terminator: String,
}

impl SimpleListPrinter {
    pub fn new(config: &SimpleListConfig) -> BansheeResult<Self> {
        Ok(Self {
            name: config.name.clone(),
            destination: Destination::open(&config.destination)?,
            terminator: config.terminator.clone(),
        })
    }
}

impl Printer for SimpleListPrinter {
    fn name(&self) -> &str {
        &self.name
    }

    fn emit(&mut self, ban: &BanRecord) -> BansheeResult<()> {
        self.destination
            .write_str(&ban.host)
            .and_then(|_| self.destination.write_str(&self.terminator))
            .map_err(|e| BansheeError::Printer(e.to_string()))
    }

    fn close(&mut self) -> BansheeResult<()> {
        self.destination
            .flush()
            .map_err(|e| BansheeError::Printer(e.to_string()))
    }
}

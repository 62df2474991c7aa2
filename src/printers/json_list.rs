//! JSON lines ban feed.
//!
//! One JSON object per ban, one ban per line: `{"host":...,"until":...}`
//! with the expiry as an ISO calendar date. Meant for whatever tooling
//! sits downstream of the scan; `jq` reads it, so does a SIEM.

use crate::printers::{Destination, Printer};
use crate::{BanRecord, BansheeError, BansheeResult, JsonListConfig};

pub struct JsonListPrinter {
    name: String,
    destination: Destination,
}

impl JsonListPrinter {
    pub fn new(config: &JsonListConfig) -> BansheeResult<Self> {
        Ok(Self {
            name: config.name.clone(),
            destination: Destination::open(&config.destination)?,
        })
    }
}

impl Printer for JsonListPrinter {
    fn name(&self) -> &str {
        &self.name
    }

    fn emit(&mut self, ban: &BanRecord) -> BansheeResult<()> {
        let line = serde_json::to_string(ban)?;
        self.destination
            .write_str(&line)
            .and_then(|_| self.destination.write_str("\n"))
            .map_err(|e| BansheeError::Printer(e.to_string()))
    }

    fn close(&mut self) -> BansheeResult<()> {
        self.destination
            .flush()
            .map_err(|e| BansheeError::Printer(e.to_string()))
    }
}

//! Template-formatted ban list.
//!
//! Renders every ban record through a user-supplied template. `{host}` and
//! `{until}` are substituted (the expiry as `YYYY-MM-DD`); everything else
//! passes through verbatim, so multi-column reports and `hosts.deny`
//! lines with options are both one template away.

use crate::blacklist::BACKLOG_DATE_FORMAT;
use crate::printers::{Destination, Printer};
use crate::{BanRecord, BansheeError, BansheeResult, FormattedListConfig};

pub struct FormattedListPrinter {
    name: String,
    destination: Destination,
    format: String,
    terminator: String,
}

impl FormattedListPrinter {
    pub fn new(config: &FormattedListConfig) -> BansheeResult<Self> {
        Ok(Self {
            name: config.name.clone(),
            destination: Destination::open(&config.destination)?,
            format: config.format.clone(),
            terminator: config.terminator.clone(),
        })
    }
}

fn render(template: &str, ban: &BanRecord) -> String {
    template
        .replace("{host}", &ban.host)
        .replace("{until}", &ban.until.format(BACKLOG_DATE_FORMAT).to_string())
}

impl Printer for FormattedListPrinter {
    fn name(&self) -> &str {
        &self.name
    }

    fn emit(&mut self, ban: &BanRecord) -> BansheeResult<()> {
        self.destination
            .write_str(&render(&self.format, ban))
            .and_then(|_| self.destination.write_str(&self.terminator))
            .map_err(|e| BansheeError::Printer(e.to_string()))
    }

    fn close(&mut self) -> BansheeResult<()> {
        self.destination
            .flush()
            .map_err(|e| BansheeError::Printer(e.to_string()))
    }
}

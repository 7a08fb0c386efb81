//! Decode subcommand implementation.
//!
//! Handles the `masscan-records decode <file>` command.

use super::{input_file, is_stdin, stdin_format};
use crate::config::AppSettings;
use crate::error::CliResult;
use crate::output::{self, OutputFormat};
use crate::output_file::{Format, Records};
use crate::types::Record;
use clap::Parser;
use ipnetwork::IpNetwork;
use std::io::{self, BufRead};
use std::path::PathBuf;
use tracing::debug;

/// Print the records of an output file.
#[derive(Parser, Debug)]
pub struct DecodeCommand {
    /// masscan output file (`-` for stdin)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Input format (inferred from the extension if omitted)
    #[arg(short, long, value_enum)]
    pub format: Option<Format>,

    /// Output format (defaults to the configured format)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Show only open ports and banners
    #[arg(long)]
    pub open_only: bool,

    /// Show only banners
    #[arg(long, conflicts_with = "open_only")]
    pub banners_only: bool,

    /// Show only hosts inside this network (e.g. 10.0.0.0/8)
    #[arg(long, value_name = "NET")]
    pub cidr: Option<String>,

    /// Stop after printing this many records
    #[arg(short = 'n', long, value_name = "COUNT")]
    pub limit: Option<usize>,
}

impl DecodeCommand {
    /// Execute the decode command.
    pub fn execute(&self, settings: &AppSettings, quiet: bool) -> CliResult<()> {
        let network = self.cidr.as_deref().map(str::parse::<IpNetwork>).transpose()?;
        let filter = RecordFilter {
            open_only: self.open_only,
            banners_only: self.banners_only,
            include_closed: settings.include_closed,
            network,
        };

        if is_stdin(&self.file) {
            let format = stdin_format(self.format)?;
            let records = Records::from_reader(format, io::stdin().lock());
            self.print_records(records, &filter, settings, quiet)
        } else {
            let file = input_file(&self.file, self.format)?;
            self.print_records(file.records()?, &filter, settings, quiet)
        }
    }

    fn print_records<R: BufRead>(
        &self,
        mut records: Records<R>,
        filter: &RecordFilter,
        settings: &AppSettings,
        quiet: bool,
    ) -> CliResult<()> {
        let format = self.output.unwrap_or(settings.default_output);
        let stdout = io::stdout();
        let mut writer =
            output::record_writer(format, stdout.lock(), settings.payload_preview_len)?;

        let mut written = 0usize;
        while self.limit.map_or(true, |limit| written < limit) {
            let record = match records.next() {
                Some(Ok(record)) => record,
                Some(Err(e)) => {
                    writer.finish()?;
                    return Err(e.into());
                }
                None => break,
            };
            if !filter.matches(&record) {
                continue;
            }
            writer.write_record(&record)?;
            written += 1;
        }
        writer.finish()?;
        debug!(written, "finished writing records");

        if !quiet {
            if records.skipped() > 0 {
                output::print_warning(&format!(
                    "skipped {} malformed lines",
                    records.skipped()
                ));
            }
            if self.limit == Some(written) {
                output::print_info(&format!("stopped after {written} records"));
            }
        }

        Ok(())
    }
}

/// Selects which records `decode` prints.
///
/// A banner implies an open port, so banners survive `open_only`.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Drop every status record that is not open.
    pub open_only: bool,
    /// Drop every status record.
    pub banners_only: bool,
    /// Keep closed and unrecognized statuses.
    pub include_closed: bool,
    /// Keep only hosts inside this network.
    pub network: Option<IpNetwork>,
}

impl RecordFilter {
    /// Check whether a record passes the filter.
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(network) = &self.network {
            if !network.contains(record.ip()) {
                return false;
            }
        }

        match record {
            Record::Banner(_) => true,
            Record::Status(status) => {
                !self.banners_only && (status.is_open() || (!self.open_only && self.include_closed))
            }
        }
    }
}

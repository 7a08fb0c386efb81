//! Summary subcommand implementation.
//!
//! Handles the `masscan-records summary <file>` command.

use super::{input_file, is_stdin, stdin_format};
use crate::error::{CliError, CliResult};
use crate::output;
use crate::output_file::{Format, Records};
use crate::stats::RecordStats;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Print record totals for an output file.
#[derive(Parser, Debug)]
pub struct SummaryCommand {
    /// masscan output file (`-` for stdin)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Input format (inferred from the extension if omitted)
    #[arg(short, long, value_enum)]
    pub format: Option<Format>,

    /// Print the totals as JSON
    #[arg(long)]
    pub json: bool,
}

impl SummaryCommand {
    /// Execute the summary command.
    pub fn execute(&self, quiet: bool) -> CliResult<()> {
        if is_stdin(&self.file) {
            let format = stdin_format(self.format)?;
            let records = Records::from_reader(format, io::stdin().lock());
            self.summarize(records, format, quiet)
        } else {
            let file = input_file(&self.file, self.format)?;
            self.summarize(file.records()?, file.format(), quiet)
        }
    }

    fn summarize<R: BufRead>(
        &self,
        mut records: Records<R>,
        format: Format,
        quiet: bool,
    ) -> CliResult<()> {
        let spinner = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} records {msg}")
                .map_err(|e| CliError::Other(e.to_string()))?,
        );
        spinner.enable_steady_tick(Duration::from_millis(100));

        let mut stats = RecordStats::new();
        for record in records.by_ref() {
            match record {
                Ok(record) => {
                    stats.add(&record);
                    spinner.inc(1);
                }
                Err(e) => {
                    spinner.abandon_with_message("decode failed");
                    return Err(e.into());
                }
            }
        }
        spinner.finish_and_clear();
        debug!("{}", stats.summary());

        if self.json {
            let totals = serde_json::json!({
                "total": stats.total,
                "open": stats.open,
                "closed": stats.closed,
                "other_status": stats.other_status,
                "banners": stats.banners,
                "distinct_hosts": stats.distinct_hosts(),
                "distinct_ports": stats.distinct_ports(),
                "first_seen": stats.first_seen,
                "last_seen": stats.last_seen,
            });
            println!("{}", serde_json::to_string_pretty(&totals)?);
        } else {
            output::print_summary(&self.file.display().to_string(), format.name(), &stats)?;
        }

        if !quiet {
            if let Some(start) = records.start_time() {
                output::print_info(&format!("scan started {start}"));
            }
            if records.skipped() > 0 {
                output::print_warning(&format!(
                    "skipped {} malformed lines",
                    records.skipped()
                ));
            }
        }

        Ok(())
    }
}

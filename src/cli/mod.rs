//! CLI subcommand definitions and handlers.
//!
//! - `masscan-records decode <file>` - Print the records of an output file
//! - `masscan-records summary <file>` - Print totals for an output file
//!
//! A file argument of `-` reads standard input and requires `--format`.

mod decode;
mod summary;

pub use crate::output::OutputFormat;
pub use decode::{DecodeCommand, RecordFilter};
pub use summary::SummaryCommand;

use crate::config::AppSettings;
use crate::error::{CliError, CliResult};
use crate::output_file::{Format, OutputFile};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// masscan-records - decode masscan output files.
///
/// Reads the binary (-oB), list (-oL), JSON (-oJ) and NDJSON output of
/// masscan and prints normalized status and banner records.
#[derive(Parser, Debug)]
#[command(name = "masscan-records")]
#[command(author = "HueCodes <huecodes@proton.me>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Decode masscan output files", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to custom configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the records of an output file
    #[command(alias = "d")]
    Decode(DecodeCommand),

    /// Print record totals for an output file
    #[command(alias = "s")]
    Summary(SummaryCommand),
}

impl Cli {
    /// Load settings and run the selected subcommand.
    pub fn run(&self) -> CliResult<()> {
        let settings = AppSettings::resolve(self.config.as_deref())?;

        match &self.command {
            Commands::Decode(cmd) => cmd.execute(&settings, self.quiet),
            Commands::Summary(cmd) => cmd.execute(self.quiet),
        }
    }
}

/// Input argument naming standard input.
pub(crate) fn is_stdin(path: &Path) -> bool {
    path == Path::new("-")
}

/// Format to use for standard input, which has no extension to go by.
pub(crate) fn stdin_format(format: Option<Format>) -> CliResult<Format> {
    format.ok_or_else(|| CliError::Other("reading from stdin requires --format".to_string()))
}

/// Describe an input file, honoring an explicit format.
pub(crate) fn input_file(path: &Path, format: Option<Format>) -> CliResult<OutputFile> {
    Ok(match format {
        Some(format) => OutputFile::with_format(path, format),
        None => OutputFile::new(path)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decode() {
        let cli = Cli::try_parse_from([
            "masscan-records",
            "-vv",
            "decode",
            "scan.bin",
            "-o",
            "json",
            "--open-only",
            "--cidr",
            "10.0.0.0/8",
            "-n",
            "5",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Decode(cmd) => {
                assert_eq!(cmd.file, PathBuf::from("scan.bin"));
                assert_eq!(cmd.output, Some(OutputFormat::Json));
                assert!(cmd.open_only);
                assert_eq!(cmd.cidr.as_deref(), Some("10.0.0.0/8"));
                assert_eq!(cmd.limit, Some(5));
                assert!(cmd.format.is_none());
            }
            Commands::Summary(_) => panic!("expected decode"),
        }
    }

    #[test]
    fn test_parse_summary_with_format() {
        let cli =
            Cli::try_parse_from(["masscan-records", "summary", "-", "-f", "ndjson", "-q"]).unwrap();

        assert!(cli.quiet);
        match cli.command {
            Commands::Summary(cmd) => {
                assert!(is_stdin(&cmd.file));
                assert_eq!(cmd.format, Some(Format::Ndjson));
            }
            Commands::Decode(_) => panic!("expected summary"),
        }
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Cli::try_parse_from(["masscan-records", "decode", "x", "-f", "xml"]).is_err());
    }

    #[test]
    fn test_open_only_conflicts_with_banners_only() {
        assert!(Cli::try_parse_from([
            "masscan-records",
            "decode",
            "x.bin",
            "--open-only",
            "--banners-only"
        ])
        .is_err());
    }

    #[test]
    fn test_stdin_needs_format() {
        assert!(stdin_format(None).is_err());
        assert_eq!(stdin_format(Some(Format::List)).unwrap(), Format::List);
    }

    #[test]
    fn test_input_file() {
        let file = input_file(Path::new("scan.txt"), None).unwrap();
        assert_eq!(file.format(), Format::List);

        let file = input_file(Path::new("scan.out"), Some(Format::Binary)).unwrap();
        assert_eq!(file.format(), Format::Binary);

        assert!(input_file(Path::new("scan.out"), None).is_err());
    }
}

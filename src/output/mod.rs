//! Output formatting module.
//!
//! Renders decoded records as plain text, JSON lines, or CSV. Records are
//! written one at a time as they are decoded.

mod csv_format;
mod json_format;
mod plain;

pub use csv_format::CsvWriter;
pub use json_format::JsonWriter;
pub use plain::{
    print_error, print_info, print_summary, print_warning, PlainWriter,
};

use crate::error::CliResult;
use crate::types::Record;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Output format for rendered records.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// One JSON object per line
    Json,
    /// CSV format for data analysis
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// A sink for rendered records.
pub trait RecordWriter {
    /// Render one record.
    fn write_record(&mut self, record: &Record) -> CliResult<()>;

    /// Flush anything buffered.
    fn finish(&mut self) -> CliResult<()>;
}

/// Create a writer for the given format.
///
/// `preview_len` limits how much of a banner payload plain output shows.
pub fn record_writer<'a, W: Write + 'a>(
    format: OutputFormat,
    out: W,
    preview_len: usize,
) -> CliResult<Box<dyn RecordWriter + 'a>> {
    let writer: Box<dyn RecordWriter + 'a> = match format {
        OutputFormat::Plain => Box::new(PlainWriter::new(out, preview_len)),
        OutputFormat::Json => Box::new(JsonWriter::new(out)),
        OutputFormat::Csv => Box::new(CsvWriter::new(out)?),
    };
    Ok(writer)
}

/// Join reason flags the way masscan prints them (`syn-ack`).
pub(crate) fn reason_text(record: &Record) -> String {
    record
        .as_status()
        .and_then(|status| status.reason.as_ref())
        .map(|flags| {
            flags
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("-")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Banner, IpProtocol, PortStatus, Status, TcpFlag};
    use chrono::DateTime;

    pub(super) fn sample_records() -> Vec<Record> {
        let ts = DateTime::from_timestamp(1629960470, 0).unwrap();
        let ip = "93.184.216.34".parse().unwrap();
        vec![
            Status::new(PortStatus::Open, IpProtocol::Tcp, 443, ip, ts)
                .with_reason(vec![TcpFlag::Syn.into(), TcpFlag::Ack.into()])
                .with_ttl(54)
                .into(),
            Banner::new(
                IpProtocol::Tcp,
                80,
                ip,
                ts,
                None,
                b"HTTP/1.0 200 OK\r\nServer: ECS".to_vec(),
            )
            .into(),
        ]
    }

    pub(super) fn render(format: OutputFormat, records: &[Record]) -> String {
        let mut buf = Vec::new();
        {
            let mut writer = record_writer(format, &mut buf, 60).unwrap();
            for record in records {
                writer.write_record(record).unwrap();
            }
            writer.finish().unwrap();
        }
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Plain.to_string(), "plain");
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_reason_text() {
        let records = sample_records();
        assert_eq!(reason_text(&records[0]), "syn-ack");
        assert_eq!(reason_text(&records[1]), "");
    }
}

//! CSV output formatting.

use super::{reason_text, RecordWriter};
use crate::error::CliResult;
use crate::types::Record;
use std::io::Write;

const HEADER: [&str; 11] = [
    "type",
    "status",
    "protocol",
    "port",
    "ip",
    "timestamp",
    "reason",
    "ttl",
    "mac",
    "app_protocol",
    "payload",
];

/// Writes records as CSV rows under a fixed header.
pub struct CsvWriter<W: Write> {
    wtr: csv::Writer<W>,
}

impl<W: Write> CsvWriter<W> {
    /// Create the writer and emit the header row.
    pub fn new(out: W) -> CliResult<Self> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(HEADER)?;
        Ok(Self { wtr })
    }
}

impl<W: Write> RecordWriter for CsvWriter<W> {
    fn write_record(&mut self, record: &Record) -> CliResult<()> {
        let row = match record {
            Record::Status(status) => [
                "status".to_string(),
                status.status.to_string(),
                status.protocol.to_string(),
                status.port.to_string(),
                status.ip.to_string(),
                status.timestamp.timestamp().to_string(),
                reason_text(record),
                status.ttl.map_or(String::new(), |ttl| ttl.to_string()),
                status.mac.map_or(String::new(), |mac| mac.to_string()),
                String::new(),
                String::new(),
            ],
            Record::Banner(banner) => [
                "banner".to_string(),
                String::new(),
                banner.protocol.to_string(),
                banner.port.to_string(),
                banner.ip.to_string(),
                banner.timestamp.timestamp().to_string(),
                String::new(),
                String::new(),
                String::new(),
                banner
                    .app_protocol
                    .as_ref()
                    .map_or(String::new(), ToString::to_string),
                banner.payload_lossy().into_owned(),
            ],
        };
        self.wtr.write_record(&row)?;
        Ok(())
    }

    fn finish(&mut self) -> CliResult<()> {
        self.wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{render, sample_records};
    use super::super::OutputFormat;

    #[test]
    fn test_csv_rows() {
        let output = render(OutputFormat::Csv, &sample_records());
        let mut rdr = csv::Reader::from_reader(output.as_bytes());

        let headers = rdr.headers().unwrap().clone();
        assert_eq!(headers.len(), 11);
        assert_eq!(&headers[0], "type");

        let rows: Vec<csv::StringRecord> = rdr.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "open");
        assert_eq!(&rows[0][6], "syn-ack");
        assert_eq!(&rows[0][7], "54");
        assert_eq!(&rows[1][0], "banner");
        assert_eq!(&rows[1][10], "HTTP/1.0 200 OK\r\nServer: ECS");
    }

    #[test]
    fn test_header_without_records() {
        let output = render(OutputFormat::Csv, &[]);
        assert_eq!(output.lines().count(), 1);
    }
}

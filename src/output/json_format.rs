//! JSON output formatting.

use super::RecordWriter;
use crate::error::CliResult;
use crate::types::Record;
use std::io::Write;

/// Writes each record as a single-line JSON object.
pub struct JsonWriter<W> {
    out: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> RecordWriter for JsonWriter<W> {
    fn write_record(&mut self, record: &Record) -> CliResult<()> {
        serde_json::to_writer(&mut self.out, record)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn finish(&mut self) -> CliResult<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{render, sample_records};
    use super::super::OutputFormat;

    #[test]
    fn test_one_object_per_line() {
        let output = render(OutputFormat::Json, &sample_records());
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "status");
        assert_eq!(lines[0]["reason"][1], "ack");
        assert_eq!(lines[1]["type"], "banner");
        assert_eq!(lines[1]["payload"], "HTTP/1.0 200 OK\r\nServer: ECS");
    }
}

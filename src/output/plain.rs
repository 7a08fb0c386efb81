//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use super::{reason_text, RecordWriter};
use crate::error::CliResult;
use crate::stats::RecordStats;
use crate::types::{PortStatus, Record, Symbol};
use console::{style, Style};
use std::io::{self, Write};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes one aligned, colored line per record.
pub struct PlainWriter<W> {
    out: W,
    preview_len: usize,
}

impl<W: Write> PlainWriter<W> {
    pub fn new(out: W, preview_len: usize) -> Self {
        Self { out, preview_len }
    }
}

impl<W: Write> RecordWriter for PlainWriter<W> {
    fn write_record(&mut self, record: &Record) -> CliResult<()> {
        match record {
            Record::Status(status) => {
                let status_style = match status.status {
                    Symbol::Known(PortStatus::Open) => Style::new().green().bold(),
                    Symbol::Known(PortStatus::Closed) => Style::new().red(),
                    Symbol::Raw(_) => Style::new().yellow(),
                };
                let mut extra = reason_text(record);
                if let Some(ttl) = status.ttl {
                    extra.push_str(&format!(" ttl={ttl}"));
                }
                if let Some(mac) = status.mac {
                    extra.push_str(&format!(" mac={mac}"));
                }

                writeln!(
                    self.out,
                    "  {:<7} {:<5} {:>5}  {:<39}  {}  {}",
                    status_style.apply_to(status.status.to_string()),
                    status.protocol,
                    status.port,
                    status.ip,
                    style(status.timestamp.format(TIME_FORMAT)).dim(),
                    extra.trim_start()
                )?;
            }
            Record::Banner(banner) => {
                let app = banner
                    .app_protocol
                    .as_ref()
                    .map_or_else(|| "-".to_string(), ToString::to_string);
                let payload = truncate_string(&printable(&banner.payload_lossy()), self.preview_len);

                writeln!(
                    self.out,
                    "  {:<7} {:<5} {:>5}  {:<39}  {}  {} {}",
                    style("banner").cyan(),
                    banner.protocol,
                    banner.port,
                    banner.ip,
                    style(banner.timestamp.format(TIME_FORMAT)).dim(),
                    style(app).bold(),
                    style(payload).dim()
                )?;
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> CliResult<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Print decode totals for a file.
pub fn print_summary(source: &str, format: &str, stats: &RecordStats) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let rule = style("═══════════════════════════════════════════════════════════════").cyan();

    writeln!(out)?;
    writeln!(out, "{rule}")?;
    writeln!(out, "  {} {}", style("File:").bold(), source)?;
    writeln!(out, "  {} {}", style("Format:").bold(), format)?;
    writeln!(out, "{rule}")?;
    writeln!(out)?;

    writeln!(
        out,
        "  {} {} records",
        style("Records:").bold(),
        style(stats.total).white().bold()
    )?;
    writeln!(
        out,
        "           {} open, {} closed, {} other, {} banners",
        style(stats.open).green().bold(),
        style(stats.closed).red(),
        style(stats.other_status).yellow(),
        style(stats.banners).cyan()
    )?;
    writeln!(
        out,
        "  {} {} hosts, {} ports",
        style("Distinct:").bold(),
        stats.distinct_hosts(),
        stats.distinct_ports()
    )?;
    if let (Some(first), Some(last)) = (stats.first_seen, stats.last_seen) {
        writeln!(
            out,
            "  {} {} .. {} ({}s)",
            style("Span:").bold(),
            first.format(TIME_FORMAT),
            last.format(TIME_FORMAT),
            stats.span_secs()
        )?;
    }
    writeln!(out)?;

    Ok(())
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    eprintln!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Escape control characters so a payload stays on one line.
fn printable(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_control() {
            out.extend(c.escape_default());
        } else {
            out.push(c);
        }
    }
    out
}

/// Truncate a string to a maximum length, adding ellipsis if truncated.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{render, sample_records};
    use super::super::OutputFormat;
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("ééééé", 4), "é...");
    }

    #[test]
    fn test_printable() {
        assert_eq!(printable("a\r\nb"), "a\\r\\nb");
        assert_eq!(printable("plain"), "plain");
    }

    #[test]
    fn test_plain_lines() {
        let output = console::strip_ansi_codes(&render(OutputFormat::Plain, &sample_records()))
            .into_owned();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("open"));
        assert!(lines[0].contains("93.184.216.34"));
        assert!(lines[0].contains("syn-ack ttl=54"));
        assert!(lines[1].contains("banner"));
        assert!(lines[1].contains("HTTP/1.0 200 OK\\r\\nServer: ECS"));
    }
}

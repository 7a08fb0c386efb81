//! Parser for the `masscan -oJ` and `--output-format ndjson` formats.
//!
//! masscan writes one JSON object per line. The `-oJ` variant wraps them in
//! an array with `[`, `,` and `]` on lines of their own:
//!
//! ```text
//! [
//! {   "ip": "93.184.216.34",   "timestamp": "1629960470", "ports": [ {"port": 443, "proto": "tcp", "status": "open", "reason": "syn-ack", "ttl": 54} ] }
//! ,
//! {   "ip": "93.184.216.34",   "timestamp": "1629960472", "ports": [ {"port": 80, "proto": "tcp", "service": {"name": "http.server", "banner": "ECS (sec/974D)"} } ] }
//! ]
//! ```
//!
//! A line that is not valid JSON ends the stream with
//! [`DecodeError::MalformedRecord`]. Valid JSON of the wrong shape (bad
//! address, out-of-range port, no `status` or `service`) is skipped with a
//! warning and counted by [`JsonRecords::skipped`].

use super::{decode_timestamp, read_line};
use crate::error::{DecodeError, DecodeResult};
use crate::symbols::{app_protocol_of, ip_protocol_of, reason_flags_of, status_of};
use crate::types::{Banner, Record, Status};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::iter::FusedIterator;
use std::net::IpAddr;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Open a JSON or NDJSON file for parsing.
pub fn open(path: impl AsRef<Path>) -> io::Result<BufReader<File>> {
    File::open(path).map(BufReader::new)
}

/// Parse JSON or NDJSON data.
pub fn parse<R: BufRead>(reader: R) -> JsonRecords<R> {
    JsonRecords::new(reader)
}

/// Why a single JSON line was rejected.
#[derive(Error, Debug)]
enum LineError {
    #[error(transparent)]
    Syntax(serde_json::Error),

    #[error("{0}")]
    Shape(String),
}

/// One host object as written by masscan.
#[derive(Debug, Deserialize)]
struct HostLine {
    ip: Option<IpAddr>,
    timestamp: Option<TimestampField>,
    #[serde(default)]
    ports: Option<Vec<serde_json::Value>>,
}

/// masscan quotes the timestamp; other producers may not.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TimestampField {
    Seconds(i64),
    Text(String),
}

impl TimestampField {
    fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Seconds(secs) => decode_timestamp(*secs),
            Self::Text(text) => text.trim().parse().ok().and_then(decode_timestamp),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PortEntry {
    port: u16,
    proto: String,
    status: Option<String>,
    reason: Option<String>,
    ttl: Option<u8>,
    service: Option<ServiceEntry>,
}

#[derive(Debug, Deserialize)]
struct ServiceEntry {
    name: Option<String>,
    #[serde(default)]
    banner: String,
}

/// Iterator over the records of a JSON or NDJSON file.
pub struct JsonRecords<R> {
    reader: R,
    buf: Vec<u8>,
    line: usize,
    skipped: usize,
    done: bool,
}

impl<R: BufRead> JsonRecords<R> {
    /// Wrap a reader positioned at the start of JSON data.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line: 0,
            skipped: 0,
            done: false,
        }
    }

    /// Number of wrongly shaped lines skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Decode the current line. `Ok(None)` means the line carries no record.
    fn decode_line(&self) -> Result<Option<Record>, LineError> {
        let trimmed = self.buf.trim_ascii();
        if trimmed.is_empty() || matches!(trimmed, b"[" | b"]" | b",") {
            return Ok(None);
        }

        let value: serde_json::Value =
            serde_json::from_slice(trimmed).map_err(LineError::Syntax)?;
        let host: HostLine = serde_json::from_value(value).map_err(shape)?;

        let Some(first) = host.ports.and_then(|ports| ports.into_iter().next()) else {
            debug!(line = self.line, "skipping JSON line without ports");
            return Ok(None);
        };

        let entry: PortEntry = serde_json::from_value(first).map_err(shape)?;
        let ip = host
            .ip
            .ok_or_else(|| LineError::Shape("missing field `ip`".into()))?;
        let timestamp = host
            .timestamp
            .as_ref()
            .and_then(TimestampField::to_datetime)
            .ok_or_else(|| LineError::Shape("missing or invalid field `timestamp`".into()))?;
        let protocol = ip_protocol_of(&entry.proto);

        if let Some(service) = entry.service {
            let banner = Banner::new(
                protocol,
                entry.port,
                ip,
                timestamp,
                service.name.as_deref().map(app_protocol_of),
                service.banner.into_bytes(),
            );
            return Ok(Some(banner.into()));
        }

        let status_text = entry.status.ok_or_else(|| {
            LineError::Shape("port entry has neither `status` nor `service`".into())
        })?;
        let mut status = Status::new(status_of(&status_text), protocol, entry.port, ip, timestamp);
        if let Some(reason) = entry.reason.as_deref() {
            status = status.with_reason(reason_flags_of(reason));
        }
        if let Some(ttl) = entry.ttl {
            status = status.with_ttl(ttl);
        }
        Ok(Some(status.into()))
    }
}

impl<R: BufRead> Iterator for JsonRecords<R> {
    type Item = DecodeResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match read_line(&mut self.reader, &mut self.buf) {
                Ok(true) => {}
                Ok(false) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
            self.line += 1;

            match self.decode_line() {
                Ok(Some(record)) => {
                    trace!(line = self.line, "decoded JSON record");
                    return Some(Ok(record));
                }
                Ok(None) => {}
                Err(LineError::Shape(reason)) => {
                    warn!(line = self.line, %reason, "skipping malformed JSON line");
                    self.skipped += 1;
                }
                Err(LineError::Syntax(e)) => {
                    self.done = true;
                    return Some(Err(DecodeError::MalformedRecord {
                        line: self.line,
                        reason: e.to_string(),
                    }));
                }
            }
        }
        None
    }
}

impl<R: BufRead> FusedIterator for JsonRecords<R> {}

fn shape(e: serde_json::Error) -> LineError {
    LineError::Shape(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AppProtocol, IpProtocol, PortStatus, Symbol, TcpFlag};
    use std::io::Cursor;

    const STATUS_LINE: &str = r#"{   "ip": "93.184.216.34",   "timestamp": "1629960470", "ports": [ {"port": 443, "proto": "tcp", "status": "open", "reason": "syn-ack", "ttl": 54} ] }"#;
    const BANNER_LINE: &str = r#"{   "ip": "93.184.216.34",   "timestamp": "1629960470", "ports": [ {"port": 443, "proto": "tcp", "service": {"name": "http.server", "banner": "ECS (sec/974D)"} } ] }"#;

    fn records(input: &str) -> JsonRecords<Cursor<Vec<u8>>> {
        parse(Cursor::new(input.as_bytes().to_vec()))
    }

    #[test]
    fn test_status_line() {
        let record = records(STATUS_LINE).next().unwrap().unwrap();
        let status = record.as_status().unwrap();

        assert_eq!(status.status, PortStatus::Open);
        assert_eq!(status.protocol, IpProtocol::Tcp);
        assert_eq!(status.port, 443);
        assert_eq!(
            status.reason,
            Some(vec![Symbol::Known(TcpFlag::Syn), Symbol::Known(TcpFlag::Ack)])
        );
        assert_eq!(status.ttl, Some(54));
        assert_eq!(status.ip, "93.184.216.34".parse::<IpAddr>().unwrap());
        assert_eq!(status.timestamp.timestamp(), 1629960470);
    }

    #[test]
    fn test_service_line_is_a_banner() {
        let record = records(BANNER_LINE).next().unwrap().unwrap();
        let banner = record.as_banner().unwrap();

        assert_eq!(banner.protocol, IpProtocol::Tcp);
        assert_eq!(banner.port, 443);
        assert_eq!(
            banner.app_protocol,
            Some(Symbol::Known(AppProtocol::HttpServer))
        );
        assert_eq!(banner.payload, b"ECS (sec/974D)");
    }

    #[test]
    fn test_array_punctuation_is_skipped() {
        let input = format!("[\n{STATUS_LINE}\n,\n{BANNER_LINE}\n]\n");
        let decoded: Vec<_> = records(&input).collect::<DecodeResult<_>>().unwrap();

        assert_eq!(decoded.len(), 2);
        assert!(decoded[0].as_status().is_some());
        assert!(decoded[1].as_banner().is_some());
    }

    #[test]
    fn test_numeric_timestamp() {
        let line = r#"{"ip": "10.0.0.1", "timestamp": 1629960470, "ports": [{"port": 22, "proto": "tcp", "status": "closed"}]}"#;
        let record = records(line).next().unwrap().unwrap();
        let status = record.as_status().unwrap();

        assert_eq!(status.status, PortStatus::Closed);
        assert_eq!(status.timestamp.timestamp(), 1629960470);
        assert!(status.reason.is_none());
        assert!(status.ttl.is_none());
    }

    #[test]
    fn test_escaped_banner_is_verbatim() {
        let line = r#"{"ip": "10.0.0.1", "timestamp": "1", "ports": [{"port": 80, "proto": "tcp", "service": {"name": "http", "banner": "a\r\nb \\x41"}}]}"#;
        let record = records(line).next().unwrap().unwrap();
        assert_eq!(record.as_banner().unwrap().payload, b"a\r\nb \\x41");
    }

    #[test]
    fn test_missing_or_empty_ports_are_skipped() {
        let input = format!(
            "{{\"ip\": \"10.0.0.1\", \"timestamp\": \"1\"}}\n{{\"ip\": \"10.0.0.1\", \"timestamp\": \"1\", \"ports\": []}}\n{STATUS_LINE}\n"
        );
        let decoded: Vec<_> = records(&input).collect::<DecodeResult<_>>().unwrap();
        assert_eq!(decoded.len(), 1);
    }

    #[test]
    fn test_invalid_json_is_fatal() {
        let input = format!("{STATUS_LINE}\n{{\"ip\": \n{STATUS_LINE}\n");
        let mut iter = records(&input);

        assert!(iter.next().unwrap().is_ok());
        match iter.next() {
            Some(Err(DecodeError::MalformedRecord { line, .. })) => assert_eq!(line, 2),
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_wrongly_shaped_lines_are_skipped() {
        let input = format!(
            "{}\n{}\n{}\n{STATUS_LINE}\n",
            r#"{"timestamp": "1", "ports": [{"port": 22, "proto": "tcp", "status": "open"}]}"#,
            r#"{"ip": "10.0.0.1", "timestamp": "1", "ports": [{"port": 70000, "proto": "tcp", "status": "open"}]}"#,
            r#"{"ip": "10.0.0.1", "timestamp": "1", "ports": [{"port": 22, "proto": "tcp"}]}"#,
        );
        let mut iter = records(&input);

        let record = iter.next().unwrap().unwrap();
        assert_eq!(record.port(), 443);
        assert!(iter.next().is_none());
        assert_eq!(iter.skipped(), 3);
    }

    #[test]
    fn test_unknown_names_are_preserved() {
        let line = r#"{"ip": "10.0.0.1", "timestamp": "1", "ports": [{"port": 5, "proto": "dccp", "status": "filtered"}]}"#;
        let record = records(line).next().unwrap().unwrap();
        let status = record.as_status().unwrap();

        assert_eq!(status.protocol, Symbol::Raw("dccp".to_string()));
        assert_eq!(status.status, Symbol::Raw("filtered".to_string()));
    }
}

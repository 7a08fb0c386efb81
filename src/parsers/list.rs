//! Parser for the `masscan -oL` list format.
//!
//! ```text
//! #masscan
//! open tcp 443 93.184.216.34 1629960470
//! banner tcp 80 93.184.216.34 1629960472 http.server ECS (sec/974D)
//! # end
//! ```
//!
//! Lines that fail to parse (bad port, address or timestamp) are skipped with
//! a warning rather than aborting the stream; [`ListRecords::skipped`] counts
//! them.

use super::{decode_timestamp, read_line};
use crate::error::DecodeResult;
use crate::symbols::{app_protocol_of, ip_protocol_of, status_of};
use crate::types::{Banner, Record, Status};
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::iter::FusedIterator;
use std::net::IpAddr;
use std::path::Path;
use thiserror::Error;
use tracing::{trace, warn};

/// Open a list file for parsing.
pub fn open(path: impl AsRef<Path>) -> io::Result<BufReader<File>> {
    File::open(path).map(BufReader::new)
}

/// Parse list-format data.
pub fn parse<R: BufRead>(reader: R) -> ListRecords<R> {
    ListRecords::new(reader)
}

/// Why a single list line was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("expected {expected} fields, found {found}")]
    MissingFields { expected: usize, found: usize },

    #[error("invalid port number: {0}")]
    InvalidPort(String),

    #[error("invalid IP address: {0}")]
    InvalidIp(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Iterator over the records of a list file.
pub struct ListRecords<R> {
    reader: R,
    buf: Vec<u8>,
    line: usize,
    skipped: usize,
    done: bool,
}

impl<R: BufRead> ListRecords<R> {
    /// Wrap a reader positioned at the start of list data.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line: 0,
            skipped: 0,
            done: false,
        }
    }

    /// Number of malformed lines skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<R: BufRead> Iterator for ListRecords<R> {
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

            match parse_line(&self.buf) {
                Ok(Some(record)) => {
                    trace!(line = self.line, "decoded list record");
                    return Some(Ok(record));
                }
                Ok(None) => {}
                Err(reason) => {
                    warn!(line = self.line, %reason, "skipping malformed list line");
                    self.skipped += 1;
                }
            }
        }
        None
    }
}

impl<R: BufRead> FusedIterator for ListRecords<R> {}

/// Parse a single line (without its terminator).
///
/// Comments and unknown line types yield `Ok(None)`.
pub fn parse_line(line: &[u8]) -> Result<Option<Record>, LineError> {
    if line.starts_with(b"#") {
        return Ok(None);
    }

    if line.starts_with(b"open ") || line.starts_with(b"closed ") {
        let fields = split_fields(line, 5);
        if fields.len() < 5 {
            return Err(LineError::MissingFields {
                expected: 5,
                found: fields.len(),
            });
        }

        let status = Status::new(
            status_of(&text(fields[0])),
            ip_protocol_of(&text(fields[1])),
            parse_port(fields[2])?,
            parse_ip(fields[3])?,
            parse_timestamp(fields[4])?,
        );
        return Ok(Some(status.into()));
    }

    if line.starts_with(b"banner ") {
        let fields = split_fields(line, 7);
        if fields.len() < 6 {
            return Err(LineError::MissingFields {
                expected: 7,
                found: fields.len(),
            });
        }

        let payload = fields.get(6).map_or_else(Vec::new, |raw| unescape_payload(raw));
        let banner = Banner::new(
            ip_protocol_of(&text(fields[1])),
            parse_port(fields[2])?,
            parse_ip(fields[3])?,
            parse_timestamp(fields[4])?,
            Some(app_protocol_of(&text(fields[5]))),
            payload,
        );
        return Ok(Some(banner.into()));
    }

    Ok(None)
}

/// Replace every `\xHH` escape with the byte it encodes.
///
/// No other escape sequence is recognized, so text without `\xHH` sequences
/// comes back unchanged.
pub fn unescape_payload(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        if input[i] == b'\\' && input.get(i + 1) == Some(&b'x') {
            let hi = input.get(i + 2).and_then(|&b| hex_value(b));
            let lo = input.get(i + 3).and_then(|&b| hex_value(b));
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi << 4) | lo);
                i += 4;
                continue;
            }
        }
        out.push(input[i]);
        i += 1;
    }

    out
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Split on runs of whitespace into at most `limit` fields.
///
/// The last field keeps the remainder of the line, inner whitespace included.
fn split_fields(line: &[u8], limit: usize) -> Vec<&[u8]> {
    let mut fields = Vec::with_capacity(limit);
    let mut rest = trim_start(line);

    while !rest.is_empty() {
        if fields.len() + 1 == limit {
            fields.push(rest);
            break;
        }
        let end = rest
            .iter()
            .position(u8::is_ascii_whitespace)
            .unwrap_or(rest.len());
        fields.push(&rest[..end]);
        rest = trim_start(&rest[end..]);
    }

    fields
}

fn trim_start(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}

fn text(field: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(field)
}

fn parse_port(field: &[u8]) -> Result<u16, LineError> {
    text(field)
        .parse()
        .map_err(|_| LineError::InvalidPort(text(field).into_owned()))
}

fn parse_ip(field: &[u8]) -> Result<IpAddr, LineError> {
    text(field)
        .parse()
        .map_err(|_| LineError::InvalidIp(text(field).into_owned()))
}

/// Only the first token counts; status lines may carry trailing text.
fn parse_timestamp(field: &[u8]) -> Result<chrono::DateTime<chrono::Utc>, LineError> {
    let field = text(field);
    field
        .split_ascii_whitespace()
        .next()
        .unwrap_or_default()
        .parse::<i64>()
        .ok()
        .and_then(decode_timestamp)
        .ok_or_else(|| LineError::InvalidTimestamp(field.to_string()))
}

//! Parser for the `masscan -oB` binary format.
//!
//! The file starts with a 99-byte pseudo-record tagged `masscan/1.1`, followed
//! by type-length-value records. Type and length are big-endian base-128
//! varints; record bodies use big-endian integers. The record types reflect
//! several revisions of masscan's writer:
//!
//! | type | record                     |
//! |------|----------------------------|
//! | 1, 2 | open/closed, IPv4          |
//! | 3    | banner, IPv4 (no protocol) |
//! | 4, 5 | banner, IPv4 + protocol    |
//! | 6, 7 | open/closed, IPv4 + proto  |
//! | 9    | banner, IPv4 + TTL         |
//! | 10, 11 | open/closed, IPv6        |
//! | 13   | banner, IPv6               |
//! | 109  | embedded file header       |
//!
//! A record body that is too short for its layout is dropped. A file that
//! ends mid-record ends the stream without error. Bad magic, an oversized
//! length, a bad IPv6 version byte or an unknown record type are fatal.

use super::decode_timestamp;
use crate::error::{Corruption, DecodeResult};
use crate::symbols::{
    app_protocol_from_index, ip_protocol_from_number, reason_flags_from_mask,
};
use crate::types::{Banner, IpProtocol, MacAddr, PortStatus, Record, Status, Symbol, TcpFlag};
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::iter::FusedIterator;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::path::Path;
use tracing::{debug, trace};

/// Size of the pseudo-record at the start of the file.
pub const PSEUDO_RECORD_SIZE: usize = 99;

/// Magic tag the pseudo-record must start with.
pub const MASSCAN_MAGIC: &[u8] = b"masscan/1.1";

/// Largest record body accepted before the stream is considered corrupt.
pub const MAX_RECORD_LEN: u64 = 1024 * 1024;

/// Record type codes.
pub mod record_type {
    pub const STATUS_OPEN: u64 = 1;
    pub const STATUS_CLOSED: u64 = 2;
    pub const BANNER: u64 = 3;
    pub const BANNER_PADDED: u64 = 4;
    pub const BANNER_V2: u64 = 5;
    pub const STATUS_OPEN_V2: u64 = 6;
    pub const STATUS_CLOSED_V2: u64 = 7;
    pub const BANNER_V3: u64 = 9;
    pub const STATUS_OPEN_V6: u64 = 10;
    pub const STATUS_CLOSED_V6: u64 = 11;
    pub const BANNER_V6: u64 = 13;
    pub const FILE_HEADER: u64 = b'm' as u64;
}

/// Open a binary file for parsing.
pub fn open(path: impl AsRef<Path>) -> io::Result<BufReader<File>> {
    File::open(path).map(BufReader::new)
}

/// Parse binary-format data.
pub fn parse<R: BufRead>(reader: R) -> BinaryRecords<R> {
    BinaryRecords::new(reader)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Header,
    Records,
    Done,
}

/// Iterator over the records of a binary file.
///
/// The pseudo-record is validated on the first call to `next`, so a bad file
/// reports [`Corruption`] before any record is produced.
pub struct BinaryRecords<R> {
    reader: R,
    state: State,
    start_time: Option<DateTime<Utc>>,
    decoded: u64,
}

impl<R: BufRead> BinaryRecords<R> {
    /// Wrap a reader positioned at the start of the pseudo-record.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            state: State::Header,
            start_time: None,
            decoded: 0,
        }
    }

    /// Scan start time.
    ///
    /// Taken from the pseudo-record when it carries one, otherwise from the
    /// first decoded record.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    /// Number of records produced so far.
    pub fn records_decoded(&self) -> u64 {
        self.decoded
    }

    fn read_pseudo_record(&mut self) -> DecodeResult<()> {
        let mut header = Vec::with_capacity(PSEUDO_RECORD_SIZE);
        (&mut self.reader)
            .take(PSEUDO_RECORD_SIZE as u64)
            .read_to_end(&mut header)?;

        if header.len() < PSEUDO_RECORD_SIZE {
            return Err(Corruption::TruncatedHeader(header.len()).into());
        }
        if !header.starts_with(MASSCAN_MAGIC) {
            return Err(Corruption::BadMagic.into());
        }

        self.start_time = scan_start_time(&header);
        if let Some(start) = self.start_time {
            debug!(%start, "pseudo-record carries scan start time");
        }
        Ok(())
    }

    /// Read records until one decodes. `Ok(None)` is the end of the stream.
    fn next_record(&mut self) -> DecodeResult<Option<Record>> {
        loop {
            let Some(kind) = read_varint(&mut self.reader)? else {
                return Ok(None);
            };
            let Some(len) = read_varint(&mut self.reader)? else {
                return Ok(None);
            };
            if len > MAX_RECORD_LEN {
                return Err(Corruption::RecordTooLarge(len).into());
            }

            let mut body = Vec::with_capacity(len as usize);
            (&mut self.reader).take(len).read_to_end(&mut body)?;
            if (body.len() as u64) < len {
                debug!(record_type = kind, len, got = body.len(), "stream ends mid-record");
                return Ok(None);
            }

            let record = match kind {
                record_type::STATUS_OPEN => parse_status(&body, PortStatus::Open),
                record_type::STATUS_CLOSED => parse_status(&body, PortStatus::Closed),
                record_type::BANNER => parse_banner3(&body),
                record_type::BANNER_PADDED => {
                    // masscan wrote one stray byte after this record type
                    read_byte(&mut self.reader)?;
                    parse_banner4(&body)
                }
                record_type::BANNER_V2 => parse_banner4(&body),
                record_type::STATUS_OPEN_V2 => parse_status2(&body, PortStatus::Open),
                record_type::STATUS_CLOSED_V2 => parse_status2(&body, PortStatus::Closed),
                record_type::BANNER_V3 => parse_banner9(&body),
                record_type::STATUS_OPEN_V6 => parse_status6(&body, PortStatus::Open)?,
                record_type::STATUS_CLOSED_V6 => parse_status6(&body, PortStatus::Closed)?,
                record_type::BANNER_V6 => parse_banner6(&body)?,
                record_type::FILE_HEADER => {
                    debug!(len, "skipping embedded file header");
                    continue;
                }
                other => return Err(Corruption::UnknownRecordType(other).into()),
            };

            match record {
                Some(record) => {
                    trace!(record_type = kind, len, "decoded binary record");
                    if self.start_time.is_none() {
                        self.start_time = Some(record.timestamp());
                    }
                    self.decoded += 1;
                    return Ok(Some(record));
                }
                None => debug!(record_type = kind, len, "dropping short record"),
            }
        }
    }
}

impl<R: BufRead> Iterator for BinaryRecords<R> {
    type Item = DecodeResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            State::Done => return None,
            State::Header => {
                if let Err(e) = self.read_pseudo_record() {
                    self.state = State::Done;
                    return Some(Err(e));
                }
                self.state = State::Records;
            }
            State::Records => {}
        }

        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.state = State::Done;
                None
            }
            Err(e) => {
                self.state = State::Done;
                Some(Err(e))
            }
        }
    }
}

impl<R: BufRead> FusedIterator for BinaryRecords<R> {}

/// Read a big-endian base-128 varint.
///
/// Returns `Ok(None)` if the stream ends before the value is complete.
/// Values wider than 64 bits saturate to `u64::MAX`.
pub fn read_varint<R: Read>(reader: &mut R) -> io::Result<Option<u64>> {
    let Some(mut byte) = read_byte(reader)? else {
        return Ok(None);
    };
    let mut value = u64::from(byte & 0x7f);

    while byte & 0x80 != 0 {
        let Some(next) = read_byte(reader)? else {
            return Ok(None);
        };
        byte = next;
        value = value
            .checked_mul(0x80)
            .map_or(u64::MAX, |shifted| shifted | u64::from(byte & 0x7f));
    }

    Ok(Some(value))
}

fn read_byte<R: Read>(reader: &mut R) -> io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Combine the two halves of an IPv6 address.
pub fn decode_ipv6(hi: u64, lo: u64) -> Ipv6Addr {
    Ipv6Addr::from((u128::from(hi) << 64) | u128::from(lo))
}

/// Find an `s:<digits>` start time inside the pseudo-record.
fn scan_start_time(header: &[u8]) -> Option<DateTime<Utc>> {
    header.windows(2).enumerate().find_map(|(i, pair)| {
        if pair != b"s:" {
            return None;
        }
        let digits = &header[i + 2..];
        let end = digits
            .iter()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(digits.len());
        let secs = std::str::from_utf8(&digits[..end]).ok()?.parse().ok()?;
        decode_timestamp(secs)
    })
}

/// Big-endian field reader over a record body.
struct Fields<'a> {
    buf: &'a [u8],
}

impl<'a> Fields<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let (head, rest) = self.buf.split_first_chunk::<N>()?;
        self.buf = rest;
        Some(*head)
    }

    fn u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn u16(&mut self) -> Option<u16> {
        self.take().map(u16::from_be_bytes)
    }

    fn u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_be_bytes)
    }

    fn u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_be_bytes)
    }

    fn timestamp(&mut self) -> Option<DateTime<Utc>> {
        decode_timestamp(i64::from(self.u32()?))
    }

    fn ipv4(&mut self) -> Option<Ipv4Addr> {
        self.u32().map(Ipv4Addr::from)
    }

    fn rest(self) -> &'a [u8] {
        self.buf
    }
}

fn protocol_symbol(number: u8) -> Symbol<IpProtocol> {
    ip_protocol_from_number(number).map_or_else(|| Symbol::Raw(number.to_string()), Symbol::Known)
}

fn reason_symbols(mask: u8) -> Vec<Symbol<TcpFlag>> {
    reason_flags_from_mask(mask)
        .into_iter()
        .map(Symbol::Known)
        .collect()
}

/// Type 1/2 records have no protocol byte; masscan infers it from the port.
fn legacy_protocol(port: u16) -> IpProtocol {
    match port {
        53 | 123 | 137 | 161 => IpProtocol::Udp,
        2905 | 36412 | 36422 => IpProtocol::Sctp,
        _ => IpProtocol::Tcp,
    }
}

/// ARP responses are recorded against 0.0.0.0 with the MAC after the layout.
fn trailing_mac(ip: Ipv4Addr, rest: &[u8]) -> Option<MacAddr> {
    if ip.is_unspecified() {
        MacAddr::from_slice(rest)
    } else {
        None
    }
}

fn check_ip_version(body: &[u8], offset: usize) -> Result<(), Corruption> {
    match body.get(offset) {
        None => Err(Corruption::MissingIpVersion),
        Some(6) => Ok(()),
        Some(&version) => Err(Corruption::BadIpVersion(version)),
    }
}

/// timestamp:u32 ip:u32 port:u16 reason:u8 ttl:u8 [mac:6]
fn parse_status(body: &[u8], status: PortStatus) -> Option<Record> {
    let mut f = Fields::new(body);
    let timestamp = f.timestamp()?;
    let ip = f.ipv4()?;
    let port = f.u16()?;
    let reason = f.u8()?;
    let ttl = f.u8()?;

    let record = Status::new(status, legacy_protocol(port), port, IpAddr::V4(ip), timestamp)
        .with_reason(reason_symbols(reason))
        .with_ttl(ttl)
        .with_mac(trailing_mac(ip, f.rest()));
    Some(record.into())
}

/// timestamp:u32 ip:u32 port:u16 app_proto:u16 payload
fn parse_banner3(body: &[u8]) -> Option<Record> {
    let mut f = Fields::new(body);
    let timestamp = f.timestamp()?;
    let ip = f.ipv4()?;
    let port = f.u16()?;
    let app_proto = f.u16()?;

    let banner = Banner::new(
        IpProtocol::Tcp,
        port,
        IpAddr::V4(ip),
        timestamp,
        app_protocol_from_index(app_proto).map(Symbol::Known),
        f.rest(),
    );
    Some(banner.into())
}

/// timestamp:u32 ip:u32 ip_proto:u8 port:u16 app_proto:u16 payload
fn parse_banner4(body: &[u8]) -> Option<Record> {
    let mut f = Fields::new(body);
    let timestamp = f.timestamp()?;
    let ip = f.ipv4()?;
    let ip_proto = f.u8()?;
    let port = f.u16()?;
    let app_proto = f.u16()?;

    let banner = Banner::new(
        protocol_symbol(ip_proto),
        port,
        IpAddr::V4(ip),
        timestamp,
        app_protocol_from_index(app_proto).map(Symbol::Known),
        f.rest(),
    );
    Some(banner.into())
}

/// timestamp:u32 ip:u32 ip_proto:u8 port:u16 reason:u8 ttl:u8 [mac:6]
fn parse_status2(body: &[u8], status: PortStatus) -> Option<Record> {
    let mut f = Fields::new(body);
    let timestamp = f.timestamp()?;
    let ip = f.ipv4()?;
    let ip_proto = f.u8()?;
    let port = f.u16()?;
    let reason = f.u8()?;
    let ttl = f.u8()?;

    let record = Status::new(status, protocol_symbol(ip_proto), port, IpAddr::V4(ip), timestamp)
        .with_reason(reason_symbols(reason))
        .with_ttl(ttl)
        .with_mac(trailing_mac(ip, f.rest()));
    Some(record.into())
}

/// timestamp:u32 ip:u32 ip_proto:u8 port:u16 app_proto:u16 ttl:u8 payload
fn parse_banner9(body: &[u8]) -> Option<Record> {
    let mut f = Fields::new(body);
    let timestamp = f.timestamp()?;
    let ip = f.ipv4()?;
    let ip_proto = f.u8()?;
    let port = f.u16()?;
    let app_proto = f.u16()?;
    let _ttl = f.u8()?;

    let banner = Banner::new(
        protocol_symbol(ip_proto),
        port,
        IpAddr::V4(ip),
        timestamp,
        app_protocol_from_index(app_proto).map(Symbol::Known),
        f.rest(),
    );
    Some(banner.into())
}

/// timestamp:u32 ip_proto:u8 port:u16 reason:u8 ttl:u8 ip_version:u8 ip_hi:u64 ip_lo:u64
fn parse_status6(body: &[u8], status: PortStatus) -> Result<Option<Record>, Corruption> {
    check_ip_version(body, 9)?;
    Ok(status6_fields(body, status))
}

fn status6_fields(body: &[u8], status: PortStatus) -> Option<Record> {
    let mut f = Fields::new(body);
    let timestamp = f.timestamp()?;
    let ip_proto = f.u8()?;
    let port = f.u16()?;
    let reason = f.u8()?;
    let ttl = f.u8()?;
    let _version = f.u8()?;
    let ip = decode_ipv6(f.u64()?, f.u64()?);

    let record = Status::new(status, protocol_symbol(ip_proto), port, IpAddr::V6(ip), timestamp)
        .with_reason(reason_symbols(reason))
        .with_ttl(ttl);
    Some(record.into())
}

/// timestamp:u32 ip_proto:u8 port:u16 app_proto:u16 ttl:u8 ip_version:u8 ip_hi:u64 ip_lo:u64 payload
fn parse_banner6(body: &[u8]) -> Result<Option<Record>, Corruption> {
    check_ip_version(body, 10)?;
    Ok(banner6_fields(body))
}

fn banner6_fields(body: &[u8]) -> Option<Record> {
    let mut f = Fields::new(body);
    let timestamp = f.timestamp()?;
    let ip_proto = f.u8()?;
    let port = f.u16()?;
    let app_proto = f.u16()?;
    let _ttl = f.u8()?;
    let _version = f.u8()?;
    let ip = decode_ipv6(f.u64()?, f.u64()?);

    let banner = Banner::new(
        protocol_symbol(ip_proto),
        port,
        IpAddr::V6(ip),
        timestamp,
        app_protocol_from_index(app_proto).map(Symbol::Known),
        f.rest(),
    );
    Some(banner.into())
}

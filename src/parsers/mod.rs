//! Decoders for masscan's output formats.
//!
//! Each submodule exposes `open(path)` and `parse(reader)`. `parse` returns a
//! lazy iterator of `DecodeResult<Record>` that stops for good after the
//! first error.

pub mod binary;
pub mod json;
pub mod list;

pub use binary::BinaryRecords;
pub use json::JsonRecords;
pub use list::ListRecords;

use chrono::{DateTime, Utc};
use std::io::{self, BufRead};

/// Convert UNIX seconds into a UTC timestamp.
pub(crate) fn decode_timestamp(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

/// Read one line into `buf` without its trailing `\n` or `\r\n`.
///
/// Returns `Ok(false)` at end of input.
pub(crate) fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(false);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_line_strips_terminators() {
        let mut reader = Cursor::new(b"one\r\ntwo\nthree".to_vec());
        let mut buf = Vec::new();

        assert!(read_line(&mut reader, &mut buf).unwrap());
        assert_eq!(buf, b"one");
        assert!(read_line(&mut reader, &mut buf).unwrap());
        assert_eq!(buf, b"two");
        assert!(read_line(&mut reader, &mut buf).unwrap());
        assert_eq!(buf, b"three");
        assert!(!read_line(&mut reader, &mut buf).unwrap());
    }

    #[test]
    fn test_decode_timestamp() {
        let ts = decode_timestamp(1629960470).unwrap();
        assert_eq!(ts.to_rfc3339(), "2021-08-26T06:47:50+00:00");
    }
}

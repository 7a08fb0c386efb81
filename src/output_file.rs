//! Format detection and a single record stream over every decoder.

use crate::error::{DecodeError, DecodeResult};
use crate::parsers::{self, BinaryRecords, JsonRecords, ListRecords};
use crate::types::Record;
use chrono::{DateTime, Utc};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// masscan output formats this crate can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Format {
    /// `-oB` type-length-value stream
    Binary,
    /// `-oL` line-oriented text
    List,
    /// `-oJ` JSON array, one object per line
    Json,
    /// `--output-format ndjson`
    Ndjson,
}

impl Format {
    /// Every decodable format.
    pub const ALL: [Format; 4] = [Self::Binary, Self::List, Self::Json, Self::Ndjson];

    /// Name used for hints and display.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::List => "list",
            Self::Json => "json",
            Self::Ndjson => "ndjson",
        }
    }

    /// Map a file extension (without the dot) to its format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "bin" | "dat" => Some(Self::Binary),
            "txt" | "list" => Some(Self::List),
            "json" => Some(Self::Json),
            "ndjson" => Some(Self::Ndjson),
            _ => None,
        }
    }

    /// Infer the format of a file from its extension.
    ///
    /// Fails with [`DecodeError::UnknownFormat`] without touching the file.
    pub fn infer(path: &Path) -> DecodeResult<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| {
                DecodeError::UnknownFormat(format!(
                    "could not infer format of {}",
                    path.display()
                ))
            })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.name() == s)
            .ok_or_else(|| DecodeError::UnknownFormat(s.to_string()))
    }
}

/// A masscan output file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    path: PathBuf,
    format: Format,
}

impl OutputFile {
    /// Describe a file, inferring its format from the extension.
    pub fn new(path: impl Into<PathBuf>) -> DecodeResult<Self> {
        let path = path.into();
        let format = Format::infer(&path)?;
        Ok(Self { path, format })
    }

    /// Describe a file with an explicit format.
    pub fn with_format(path: impl Into<PathBuf>, format: Format) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// Path to the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Format the file will be decoded as.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Open the file and stream its records.
    ///
    /// Each call reopens the file and starts from the beginning.
    pub fn records(&self) -> DecodeResult<Records<BufReader<File>>> {
        debug!(path = %self.path.display(), format = %self.format, "opening output file");
        let reader = match self.format {
            Format::Binary => parsers::binary::open(&self.path)?,
            Format::List => parsers::list::open(&self.path)?,
            Format::Json | Format::Ndjson => parsers::json::open(&self.path)?,
        };
        Ok(Records::from_reader(self.format, reader))
    }
}

/// Open a file and stream its records.
///
/// `hint` names the format explicitly (`binary`, `list`, `json`, `ndjson`);
/// without one the format is inferred from the extension.
pub fn decode_file(
    path: impl Into<PathBuf>,
    hint: Option<&str>,
) -> DecodeResult<Records<BufReader<File>>> {
    let file = match hint {
        Some(hint) => OutputFile::with_format(path, hint.parse()?),
        None => OutputFile::new(path)?,
    };
    file.records()
}

/// Records decoded from any supported format.
pub enum Records<R> {
    Binary(BinaryRecords<R>),
    List(ListRecords<R>),
    Json(JsonRecords<R>),
}

impl<R: BufRead> Records<R> {
    /// Decode records of the given format from a reader.
    pub fn from_reader(format: Format, reader: R) -> Self {
        match format {
            Format::Binary => Self::Binary(parsers::binary::parse(reader)),
            Format::List => Self::List(parsers::list::parse(reader)),
            Format::Json | Format::Ndjson => Self::Json(parsers::json::parse(reader)),
        }
    }

    /// Scan start time, for binary files.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Binary(records) => records.start_time(),
            Self::List(_) | Self::Json(_) => None,
        }
    }

    /// Malformed lines skipped so far, for list and JSON files.
    pub fn skipped(&self) -> usize {
        match self {
            Self::List(records) => records.skipped(),
            Self::Json(records) => records.skipped(),
            Self::Binary(_) => 0,
        }
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = DecodeResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Binary(records) => records.next(),
            Self::List(records) => records.next(),
            Self::Json(records) => records.next(),
        }
    }
}

impl<R: BufRead> FusedIterator for Records<R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_infer_format() {
        let cases = [
            ("/path/to/file.bin", Format::Binary),
            ("/path/to/file.dat", Format::Binary),
            ("/path/to/file.txt", Format::List),
            ("/path/to/file.list", Format::List),
            ("/path/to/file.json", Format::Json),
            ("/path/to/file.ndjson", Format::Ndjson),
        ];
        for (path, expected) in cases {
            assert_eq!(Format::infer(Path::new(path)).unwrap(), expected, "{path}");
        }
    }

    #[test]
    fn test_infer_unknown_extension() {
        for path in ["/path/to/file.xml", "/path/to/file", "/path/to/file.JSON"] {
            assert!(matches!(
                Format::infer(Path::new(path)),
                Err(DecodeError::UnknownFormat(_))
            ));
        }
    }

    #[test]
    fn test_format_hint() {
        assert_eq!("ndjson".parse::<Format>().unwrap(), Format::Ndjson);
        assert_eq!(Format::List.to_string(), "list");
        assert!(matches!(
            "xml".parse::<Format>(),
            Err(DecodeError::UnknownFormat(hint)) if hint == "xml"
        ));
    }

    #[test]
    fn test_output_file_format() {
        let file = OutputFile::new("/path/to/file.json").unwrap();
        assert_eq!(file.format(), Format::Json);
        assert_eq!(file.path(), Path::new("/path/to/file.json"));

        let file = OutputFile::with_format("/path/to/file.json", Format::List);
        assert_eq!(file.format(), Format::List);
    }

    #[test]
    fn test_unknown_hint_fails_before_io() {
        let result = decode_file("/nonexistent/file.bin", Some("xml"));
        assert!(matches!(result, Err(DecodeError::UnknownFormat(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = decode_file("/nonexistent/file.bin", None);
        assert!(matches!(result, Err(DecodeError::Io(_))));
    }

    #[test]
    fn test_from_reader_dispatches() {
        let list = Cursor::new(b"open tcp 80 10.0.0.1 1629960470\n".to_vec());
        let records: Vec<_> = Records::from_reader(Format::List, list)
            .collect::<DecodeResult<_>>()
            .unwrap();
        assert_eq!(records.len(), 1);

        let json = Cursor::new(
            br#"{"ip": "10.0.0.1", "timestamp": "1629960470", "ports": [{"port": 80, "proto": "tcp", "status": "open"}]}"#
                .to_vec(),
        );
        let records: Vec<_> = Records::from_reader(Format::Ndjson, json)
            .collect::<DecodeResult<_>>()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].port(), 80);
    }

    #[test]
    fn test_binary_bad_magic_through_dispatcher() {
        let mut records = Records::from_reader(Format::Binary, Cursor::new(vec![0u8; 120]));
        assert!(matches!(records.next(), Some(Err(e)) if e.is_corruption()));
        assert!(records.next().is_none());
    }
}

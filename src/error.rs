//! Error types for masscan-records.
//!
//! Uses `thiserror` for ergonomic error definitions.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for decoding operations.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("unknown output format: {0}")]
    UnknownFormat(String),

    #[error("corrupted binary stream: {0}")]
    CorruptedStream(#[from] Corruption),

    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    /// Check if this error came from a corrupted binary stream.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::CorruptedStream(_))
    }
}

/// Framing-level violations in the binary format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Corruption {
    #[error("pseudo-record truncated ({0} of 99 bytes)")]
    TruncatedHeader(usize),

    #[error("unknown file format (expected masscan/1.1)")]
    BadMagic,

    #[error("record length {0} exceeds the 1 MiB limit")]
    RecordTooLarge(u64),

    #[error("IPv6 record too short to hold the ip_version field")]
    MissingIpVersion,

    #[error("expected ip_version to be 6: {0}")]
    BadIpVersion(u8),

    #[error("unknown record type: {0}")]
    UnknownRecordType(u64),
}

/// Result type alias for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors raised while loading application settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine the configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings file: {0}")]
    InvalidFormat(String),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors surfaced by the command-line front end.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid network filter: {0}")]
    InvalidNetwork(#[from] ipnetwork::IpNetworkError),

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

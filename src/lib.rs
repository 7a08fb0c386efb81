//! # masscan-records - decode masscan output files
//!
//! masscan can write its results in several formats. This crate reads the
//! binary (`-oB`), list (`-oL`), JSON (`-oJ`) and NDJSON formats back into a
//! single stream of normalized records, so downstream tools never need to
//! care which mode produced a file.
//!
//! ## Features
//!
//! - **Binary**: every record-type revision masscan has written, IPv4 and
//!   IPv6, with corruption detection
//! - **List and JSON**: the same records from the text formats
//! - **Lazy**: records are decoded one at a time from a buffered reader
//! - **Lossless symbols**: unrecognized names are kept as raw text
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use masscan_records::{OutputFile, Record};
//!
//! fn main() -> Result<(), masscan_records::DecodeError> {
//!     let file = OutputFile::new("scan.bin")?;
//!
//!     for record in file.records()? {
//!         match record? {
//!             Record::Status(status) => println!("{} {}/{}", status.ip, status.port, status.protocol),
//!             Record::Banner(banner) => println!("{} {}", banner.ip, banner.payload_lossy()),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - The record model and its enumerations
//! - [`symbols`] - Lookup tables for masscan's text and numeric codes
//! - [`parsers`] - One decoder per format
//! - [`output_file`] - Format detection and a single record stream
//! - [`stats`] - Aggregate counts over records
//! - [`config`], [`output`], [`cli`] - The `masscan-records` binary
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod output_file;
pub mod parsers;
pub mod stats;
pub mod symbols;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, Corruption, DecodeError, DecodeResult};
pub use output_file::{decode_file, Format, OutputFile, Records};
pub use stats::RecordStats;
pub use types::{Banner, Record, Status, Symbol};

//! # Codec Module
//!
//! Byte- and text-level formats used by the export/import pipeline.
//!
//! - **crc32**: CRC-32 (IEEE, reflected polynomial `0xEDB88320`) over `crc32fast`
//! - **csv**: field escaping, record encoding and a lenient quote-aware parser
//! - **zip_writer**: store-only ZIP archive assembly
//! - **zip_reader**: store-only ZIP archive extraction
//!
//! Nothing in here touches storage or the network; every function is pure over
//! byte slices and strings.

pub mod crc32;
pub mod csv;
pub mod zip_reader;
pub mod zip_writer;

pub use crc32::crc32;
pub use csv::{encode_records, escape_field, parse_rows, CsvTable, CsvValue};
pub use zip_reader::{read_archive, Archive, ArchiveEntry};
pub use zip_writer::{DosDateTime, ZipWriter};

/// Local file header signature (`PK\x03\x04`)
pub const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x0403_4b50;
/// Central directory file header signature (`PK\x01\x02`)
pub const CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0201_4b50;
/// End of central directory record signature (`PK\x05\x06`)
pub const END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x0605_4b50;

pub(crate) const LOCAL_FILE_HEADER_LEN: usize = 30;
pub(crate) const CENTRAL_DIRECTORY_HEADER_LEN: usize = 46;
pub(crate) const END_OF_CENTRAL_DIRECTORY_LEN: usize = 22;

/// Version needed to extract: 2.0
pub(crate) const ZIP_VERSION: u16 = 20;
/// General purpose bit 11: file names are UTF-8
pub(crate) const FLAG_UTF8_NAMES: u16 = 0x0800;
/// Compression method 0: stored
pub(crate) const METHOD_STORE: u16 = 0;

/// Errors raised while writing or reading an archive
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArchiveError {
    /// Structure is not a readable store-only ZIP
    #[error("invalid archive: {0}")]
    InvalidArchive(&'static str),

    /// Entry uses a compression method this reader cannot extract
    #[error("unsupported entry {name}: compression method {method}")]
    UnsupportedEntry { name: String, method: u16 },

    /// Entry content does not match the CRC-32 recorded in the central directory
    #[error("checksum mismatch for entry {name}")]
    ChecksumMismatch { name: String },

    /// Value does not fit the 16/32-bit fields of a non-Zip64 archive
    #[error("archive too large: {0}")]
    TooLarge(&'static str),
}

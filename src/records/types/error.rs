//! Custom error types for the line-records crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
///
/// End-of-stream and out-of-range seeks are deliberately absent: the first is
/// reported through `RecordCursor::valid`, the second is clamped.
#[derive(Debug, Error)]
pub enum RecordsError {
    /// An error raised by the underlying stream (read, seek or tell).
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// A persisted side index is structurally invalid.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A side index checksum validation failed, indicating data corruption.
    #[error("Checksum mismatch: expected {expected:#x}, got {actual:#x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// An offset table whose offsets do not strictly increase with the ordinal.
    #[error("Offset table is not increasing at ordinal {ordinal}: {offset} follows {previous}")]
    NonMonotonicOffsets {
        ordinal: u64,
        previous: u64,
        offset: u64,
    },

    /// An offset table that cannot describe a line-delimited stream.
    #[error("Invalid offset table: {0}")]
    InvalidTable(String),

    /// The requested text encoding cannot be split on the `\n` byte.
    #[error("Unsupported encoding: {0}. Only ASCII-compatible encodings can be read line by line.")]
    UnsupportedEncoding(String),
}

/// A convenience `Result` type alias using the crate's `RecordsError` type.
pub type Result<T> = std::result::Result<T, RecordsError>;

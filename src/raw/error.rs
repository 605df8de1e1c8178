//! Error types for raw directory scanning.

use thiserror::Error;

use crate::codec::CodecError;

/// Errors raised while reading `_FUNCxxx` and `_CHROxxx` files.
#[derive(Error, Debug)]
pub enum RawError {
    /// A required file is missing or unreadable
    #[error("File not found: {0}")]
    NotFound(String),

    /// Corrupt or unrecognized content
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A read stopped before the expected number of bytes
    #[error("Short read in {file}: expected {expected} bytes, got {actual}")]
    PartialRead {
        /// File or record being read
        file: String,
        /// Bytes required
        expected: usize,
        /// Bytes available
        actual: usize,
    },

    /// Packed value decoding failed
    #[error("Decode error: {0}")]
    Codec(#[from] CodecError),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

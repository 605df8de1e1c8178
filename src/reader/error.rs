use crate::byspec2::Byspec2Error;
use crate::calibration::CalibrationError;
use crate::centroid::CentroidError;
use crate::classify::ClassifyError;
use crate::codec::CodecError;
use crate::raw::RawError;

/// Errors that can occur while converting a raw directory
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// Missing or unreadable file
    #[error("Not found: {0}")]
    NotFound(String),

    /// Corrupt or unrecognized metadata or scan data
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Invalid caller-supplied option
    #[error("Bad parameter: {0}")]
    BadParameter(String),

    /// A scan buffer could not be allocated
    #[error("Allocation failure: {0}")]
    AllocationFailure(String),

    /// Schema, statement or transaction failure
    #[error("Database error: {0}")]
    DatabaseError(#[from] Byspec2Error),

    /// Short read from a file of known length
    #[error("Short read in {file}: expected {expected} bytes, got {actual}")]
    PartialRead {
        /// File or record being read
        file: String,
        /// Bytes required
        expected: usize,
        /// Bytes available
        actual: usize,
    },

    /// The cancellation token was triggered
    #[error("Conversion cancelled")]
    Cancelled,

    /// Input or output path is unusable
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<RawError> for ReaderError {
    fn from(e: RawError) -> Self {
        match e {
            RawError::NotFound(file) => ReaderError::NotFound(file),
            RawError::ParseError(msg) => ReaderError::ParseError(msg),
            RawError::PartialRead {
                file,
                expected,
                actual,
            } => ReaderError::PartialRead {
                file,
                expected,
                actual,
            },
            RawError::Codec(e) => e.into(),
            RawError::IoError(e) => ReaderError::IoError(e),
        }
    }
}

impl From<CodecError> for ReaderError {
    fn from(e: CodecError) -> Self {
        ReaderError::ParseError(e.to_string())
    }
}

impl From<ClassifyError> for ReaderError {
    fn from(e: ClassifyError) -> Self {
        match e {
            ClassifyError::IoError(e) => ReaderError::IoError(e),
            other => ReaderError::ParseError(other.to_string()),
        }
    }
}

impl From<CalibrationError> for ReaderError {
    fn from(e: CalibrationError) -> Self {
        match e {
            CalibrationError::IoError(e) => ReaderError::IoError(e),
            other => ReaderError::ParseError(other.to_string()),
        }
    }
}

impl From<CentroidError> for ReaderError {
    fn from(e: CentroidError) -> Self {
        match e {
            CentroidError::BadParameter(msg) => ReaderError::BadParameter(msg),
            other => ReaderError::ParseError(other.to_string()),
        }
    }
}

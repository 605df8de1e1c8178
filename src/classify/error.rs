//! Error types for function classification.

use thiserror::Error;

/// Errors raised while reading function metadata.
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// Malformed `_FUNCTNS.INF` or `_extern.inf` content
    #[error("Metadata parse error: {0}")]
    ParseError(String),

    /// Neither `_FUNCTNS.INF` nor `_extern.inf` yielded any function
    #[error("No acquisition functions found in {0}")]
    NoFunctions(String),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

//! Error types for byspec2 output.

use thiserror::Error;

/// Errors raised while writing a byspec2 database.
#[derive(Error, Debug)]
pub enum Byspec2Error {
    /// SQLite statement, schema or transaction failure
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Rows that cannot be stored as given
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

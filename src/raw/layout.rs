//! File naming inside a Waters `.raw` directory.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::error::RawError;

/// Auxiliary chromatogram index.
pub const CHROMS_FILE: &str = "_CHROMS.INF";

/// Per-function file kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionFile {
    /// Packed scan points
    Dat,
    /// Per-scan index records
    Idx,
    /// Per-scan status records (precursor m/z)
    Sts,
}

impl FunctionFile {
    /// Upper-case file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            FunctionFile::Dat => "DAT",
            FunctionFile::Idx => "IDX",
            FunctionFile::Sts => "STS",
        }
    }
}

impl fmt::Display for FunctionFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// `_FUNC001.DAT` style name of a function file.
pub fn function_file_name(function: u32, kind: FunctionFile) -> String {
    format!("_FUNC{:03}.{}", function, kind.extension())
}

/// Full path of a function file.
pub fn function_path(dir: &Path, function: u32, kind: FunctionFile) -> PathBuf {
    dir.join(function_file_name(function, kind))
}

/// `_CHRO001.DAT` style name of an auxiliary trace.
pub fn chro_file_name(number: u32) -> String {
    format!("_CHRO{:03}.DAT", number)
}

/// Read a whole file; a missing file maps to [`RawError::NotFound`] and an empty
/// one to [`RawError::ParseError`].
pub fn read_required(path: &Path) -> Result<Vec<u8>, RawError> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => RawError::NotFound(path.display().to_string()),
        _ => RawError::IoError(e),
    })?;
    if bytes.is_empty() {
        return Err(RawError::ParseError(format!(
            "empty file {}",
            path.display()
        )));
    }
    Ok(bytes)
}

/// Read a file that may legitimately be absent.
pub fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, RawError> {
    match read_required(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(RawError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

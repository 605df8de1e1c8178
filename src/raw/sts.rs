//! `_FUNCxxx.STS` per-scan status records.
//!
//! The file starts with a `u16` header length and, at byte 4, a `u16` record
//! length. The precursor m/z of each scan is an `f32` at a fixed offset inside its
//! record. Older instruments shift that offset by four bytes; the shift is
//! detected once per run by checking which offset yields plausible values.

use std::ops::RangeInclusive;

use log::{debug, warn};

use super::cursor::ByteCursor;
use super::error::RawError;

/// Plausible precursor m/z values; 0 is accepted as "not set".
pub const PRECURSOR_RANGE: RangeInclusive<f64> = 10.0..=10000.0;

/// Precursor value reported when a scan has no status record.
pub const NO_PRECURSOR: f32 = -1.0;

const OVERRIDE_CHECK_RECORDS: usize = 50;

/// Offset and stride of the precursor field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StsGeometry {
    /// Precursor offset inside a record
    pub offset: usize,
    /// Record stride used by the override check
    pub stride: usize,
}

impl StsGeometry {
    /// Layout for the given codec family, with or without the legacy shift.
    pub fn new(type1_6: bool, shifted: bool) -> Self {
        match (type1_6, shifted) {
            (true, false) => Self { offset: 0x26, stride: 0x76 },
            (false, false) => Self { offset: 0x2a, stride: 0x95 },
            (true, true) => Self { offset: 0x2a, stride: 0x7a },
            (false, true) => Self { offset: 0x2e, stride: 0x99 },
        }
    }

    /// Offset actually used to read precursors.
    ///
    /// The shifted Type1-6 layout reads at the regular Type1 offset.
    pub fn read_offset(type1_6: bool, shifted: bool) -> usize {
        if shifted || !type1_6 {
            0x2a
        } else {
            0x26
        }
    }
}

/// Parsed status file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StsHeader {
    /// Bytes before the first record
    pub header_len: usize,
    /// Bytes per record
    pub record_len: usize,
}

/// Read the header of a status file.
pub fn parse_header(name: &str, bytes: &[u8]) -> Result<StsHeader, RawError> {
    let mut cur = ByteCursor::new(name, bytes);
    let header_len = cur.read_u16()? as usize;
    cur.seek(4)?;
    let record_len = cur.read_u16()? as usize;
    if record_len == 0 {
        return Err(RawError::ParseError(format!("{}: zero record length", name)));
    }
    Ok(StsHeader {
        header_len,
        record_len,
    })
}

fn all_plausible(records: &[u8], geometry: StsGeometry) -> bool {
    let mut cur = ByteCursor::new("sts", records);
    let mut pos = geometry.offset;
    for _ in 0..OVERRIDE_CHECK_RECORDS {
        if cur.seek(pos).is_err() {
            break;
        }
        let Ok(value) = cur.read_f32() else {
            break;
        };
        let value = value as f64;
        if value != 0.0 && !PRECURSOR_RANGE.contains(&value) {
            return false;
        }
        pos += geometry.stride;
    }
    true
}

/// Decide whether the shifted precursor layout applies.
///
/// `records` starts after the header. The regular layout wins unless it yields an
/// implausible value and the shifted layout yields none.
pub fn detect_shift(records: &[u8], type1_6: bool) -> bool {
    if all_plausible(records, StsGeometry::new(type1_6, false)) {
        return false;
    }
    let shifted = StsGeometry::new(type1_6, true);
    if shifted.offset + 4 > records.len() {
        return false;
    }
    let detected = all_plausible(records, shifted);
    if detected {
        debug!("STS precursor offset shifted by 4 bytes");
    }
    detected
}

/// Precursor m/z of the first `scans` scans.
///
/// Scans past the end of the file get [`NO_PRECURSOR`].
pub fn read_precursors(
    name: &str,
    bytes: &[u8],
    scans: usize,
    type1_6: bool,
    shifted: bool,
) -> Result<Vec<f32>, RawError> {
    let header = parse_header(name, bytes)?;
    if header.header_len >= bytes.len() {
        warn!("{}: header length {} past end of file", name, header.header_len);
        return Ok(vec![NO_PRECURSOR; scans]);
    }
    let expected = StsGeometry::new(type1_6, shifted).stride;
    if expected != header.record_len {
        debug!(
            "{}: record length 0x{:x} differs from the expected 0x{:x}",
            name, header.record_len, expected
        );
    }
    let mut cur = ByteCursor::new(name, bytes);
    let first = header.header_len + StsGeometry::read_offset(type1_6, shifted);
    let mut out = Vec::with_capacity(scans);
    for scan in 0..scans {
        let pos = first + scan * header.record_len;
        let value = if cur.seek(pos).is_ok() && cur.has(4) {
            cur.read_f32()?
        } else {
            NO_PRECURSOR
        };
        out.push(value);
    }
    Ok(out)
}

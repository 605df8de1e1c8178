//! `_FUNCxxx.IDX` per-scan index records.

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, warn};
use serde::Serialize;

use super::cursor::ByteCursor;
use super::error::RawError;

/// Record sizes seen in the wild.
pub const IDX_RECORD_SIZES: [usize; 2] = [22, 30];

/// Flag byte value marking centroid data.
pub const CENTROID_FLAG: u8 = 0x08;

const POINT_COUNT_OFFSET: usize = 4;
const TRACE_VALUE_OFFSET: usize = 8;
const RETENTION_TIME_OFFSET: usize = 12;
const TIC_OFFSET: usize = 16;

// Retention time sanity window in seconds, and how many records to check
const RT_CHECK_MIN: f32 = 0.1;
const RT_CHECK_MAX: f32 = 7200.0;
const RT_CHECK_RECORDS: usize = 100;

/// One index record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IdxRecord {
    /// Number of points stored in the DAT file for this scan
    pub point_count: u32,
    /// Flag byte following the point count
    pub flags: u8,
    /// Value slot used by UV trace functions
    pub trace_value: f32,
    /// Retention time in minutes
    pub retention_time: f32,
    /// Total ion current
    pub tic: f32,
}

impl IdxRecord {
    /// Metadata peak mode of the scan.
    pub fn is_centroid(&self) -> bool {
        self.flags == CENTROID_FLAG
    }

    /// Retention time in seconds.
    pub fn retention_time_secs(&self) -> f32 {
        self.retention_time * 60.0
    }

    /// Encode into a record of `size` bytes.
    pub fn encode(&self, size: usize) -> Vec<u8> {
        let mut out = vec![0u8; size.max(TIC_OFFSET + 4)];
        let count = self.point_count & 0x3F_FFFF;
        out[POINT_COUNT_OFFSET] = (count & 0xFF) as u8;
        out[POINT_COUNT_OFFSET + 1] = ((count >> 8) & 0xFF) as u8;
        out[POINT_COUNT_OFFSET + 2] = ((count >> 16) & 0x3F) as u8;
        out[POINT_COUNT_OFFSET + 3] = self.flags;
        LittleEndian::write_f32(&mut out[TRACE_VALUE_OFFSET..], self.trace_value);
        LittleEndian::write_f32(&mut out[RETENTION_TIME_OFFSET..], self.retention_time);
        LittleEndian::write_f32(&mut out[TIC_OFFSET..], self.tic);
        out
    }
}

fn decode_record(cur: &mut ByteCursor<'_>, start: usize) -> Result<IdxRecord, RawError> {
    cur.seek(start + POINT_COUNT_OFFSET)?;
    let b0 = cur.read_u8()? as u32;
    let b1 = cur.read_u8()? as u32;
    // the two high bits carry acquisition flags
    let b2 = (cur.read_u8()? & 0x3F) as u32;
    let flags = cur.read_u8()?;
    let trace_value = cur.read_f32()?;
    let retention_time = cur.read_f32()?;
    let tic = cur.read_f32()?;
    Ok(IdxRecord {
        point_count: (b2 << 16) | (b1 << 8) | b0,
        flags,
        trace_value,
        retention_time,
        tic,
    })
}

/// Decode every complete record of an index file.
pub fn parse_idx(name: &str, bytes: &[u8], record_size: usize) -> Result<Vec<IdxRecord>, RawError> {
    if !IDX_RECORD_SIZES.contains(&record_size) {
        return Err(RawError::ParseError(format!(
            "unsupported IDX record size {}",
            record_size
        )));
    }
    if bytes.len() % record_size != 0 {
        warn!(
            "{}: {} trailing bytes ignored",
            name,
            bytes.len() % record_size
        );
    }
    let mut cur = ByteCursor::new(name, bytes);
    (0..bytes.len() / record_size)
        .map(|i| decode_record(&mut cur, i * record_size))
        .collect()
}

/// Retention times of the first records look like a real gradient.
fn retention_times_plausible(first: &[u8], record_size: usize) -> bool {
    let records = (first.len() / record_size).min(RT_CHECK_RECORDS);
    if records == 0 {
        return false;
    }
    let times: Vec<f32> = (0..records)
        .map(|i| {
            let off = i * record_size + RETENTION_TIME_OFFSET;
            LittleEndian::read_f32(&first[off..off + 4]) * 60.0
        })
        .collect();
    times.windows(2).all(|w| {
        let cur = w[1];
        (RT_CHECK_MIN..=RT_CHECK_MAX).contains(&cur) && cur >= w[0]
    })
}

/// Pick the IDX record size from all index file sizes and the content of the
/// first function's index.
///
/// The size dividing the most files wins; files divisible by both count for 22.
/// A tie resolves to 30. The winner is then checked against the retention times
/// of the first function and swapped for the other size if they look wrong.
pub fn detect_record_size(file_sizes: &[usize], first: Option<&[u8]>) -> Option<usize> {
    let sizes: Vec<usize> = file_sizes.iter().copied().filter(|&s| s > 0).collect();
    let by_22 = sizes.iter().filter(|&&s| s % 22 == 0).count();
    let by_30 = sizes.iter().filter(|&&s| s % 30 == 0).count();
    let only_30 = sizes.iter().filter(|&&s| s % 30 == 0 && s % 22 != 0).count();

    let (preferred, other) = if by_22 == 0 && only_30 == 0 {
        debug!("no IDX file size divides by 22 or 30");
        return None;
    } else if by_22 > only_30 {
        (22, 30)
    } else if only_30 > by_22 || by_22 != by_30 {
        (30, 22)
    } else {
        warn!("IDX record size ambiguous, using 30");
        return Some(30);
    };

    match first {
        Some(first) if !retention_times_plausible(first, preferred) => {
            debug!(
                "IDX record size {} fails the retention time check, using {}",
                preferred, other
            );
            Some(other)
        }
        _ => Some(preferred),
    }
}

//! Codec variant and peak mode probing.
//!
//! Each probe looks at raw DAT bytes of the first scan(s) and answers one
//! question; none of them fails on odd data, they just say no.

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, warn};

use crate::classify::CentroidMode;
use crate::codec::{
    decode_intensity_type1, decode_mz_type1, decode_mz_type1_6, decode_mz_type1_6_v3c,
    PointLayout, V3cTable, MZ_CEILING, MZ_FLOOR,
};

use super::idx::IdxRecord;
use super::sts::PRECURSOR_RANGE;

/// Scans shorter than this never decide the peak mode.
pub const MIN_CENTROID_LEN: usize = 256;

/// Largest m/z step allowed from a zero sample to the next nonzero sample in a
/// Type1-6 profile.
pub const MAX_TYPE1_6_GAP: f64 = 0.3;

/// Tolerance on consecutive m/z deltas for a regular (profile) grid.
pub const MAX_DELTA_JITTER: f64 = 5e-4;

/// Point counts at or above this are rejected by the V3C probe.
pub const MAX_V3C_POINTS: usize = 10_000_000;

/// Scans longer than this need at least a third zeros to pass as Type1-6.
const TYPE1_6_ZERO_CHECK_LEN: usize = 100;

const CAL_OFFSET_CHECK_POINTS: usize = 100;

/// Does the first scan of function 1 look like 6-byte Type1-6 points?
///
/// The scale byte of every m/z word must be in `0x60..=0xF0`, m/z must not go
/// down, and the step out of a zero sample must stay small. Unless
/// `expect_no_zeros` is set, long scans also need a third of their samples zero.
pub fn probe_type1_6(dat: &[u8], point_count: usize, expect_no_zeros: bool) -> bool {
    if point_count == 0 || dat.len() < point_count * 6 {
        return false;
    }
    let mut zeros = 0usize;
    let mut prev_mz = 0.0f64;
    let mut prev_intensity = 0u16;
    for (i, rec) in dat[..point_count * 6].chunks_exact(6).enumerate() {
        let intensity = LittleEndian::read_u16(&rec[0..2]);
        let word = LittleEndian::read_u32(&rec[2..6]);
        if intensity == 0 {
            zeros += 1;
        }
        let scale = word & 0xF0;
        if !(0x60..=0xF0).contains(&scale) {
            return false;
        }
        let mz = decode_mz_type1_6(word & 0xFFFF_FFF0);
        if mz < prev_mz {
            return false;
        }
        if i > 0 && intensity > 0 && prev_intensity == 0 && mz - prev_mz > MAX_TYPE1_6_GAP {
            return false;
        }
        prev_mz = mz;
        prev_intensity = intensity;
    }
    if !expect_no_zeros && point_count > TYPE1_6_ZERO_CHECK_LEN && zeros < point_count / 3 {
        return false;
    }
    true
}

/// Does the first scan of the lock-mass function use V3C points?
///
/// Every point must carry a nonzero intensity and an m/z inside the Type1 range,
/// in ascending order.
pub fn probe_v3c(dat: &[u8], point_count: usize, table: &V3cTable) -> bool {
    if point_count >= MAX_V3C_POINTS {
        warn!("V3C probe: point count {} out of range", point_count);
        return false;
    }
    if point_count == 0 || dat.len() < point_count * 12 {
        return false;
    }
    let mut prev_mz = 0.0f64;
    for rec in dat[..point_count * 12].chunks_exact(12) {
        let intensity = table.decode(LittleEndian::read_u32(&rec[0..4]));
        if intensity == 0.0 || (intensity + 0.5) as u32 == 0 {
            return false;
        }
        let mz = decode_mz_type1_6_v3c(LittleEndian::read_u32(&rec[4..8]));
        if !(MZ_FLOOR..MZ_CEILING).contains(&mz) || mz < prev_mz {
            return false;
        }
        prev_mz = mz;
    }
    true
}

/// Do Type1 points carry a third (calibration) word?
///
/// Reading the scan with a 12-byte stride must give strictly increasing m/z in
/// the precursor range over the first hundred points.
pub fn probe_cal_offset(dat: &[u8], point_count: usize) -> bool {
    let n = point_count.min(CAL_OFFSET_CHECK_POINTS);
    if n == 0 || dat.len() < n * 12 {
        return false;
    }
    let mut prev = f64::NEG_INFINITY;
    for rec in dat[..n * 12].chunks_exact(12) {
        let mz = decode_mz_type1(LittleEndian::read_u32(&rec[4..8]));
        if !PRECURSOR_RANGE.contains(&mz) || mz <= prev {
            return false;
        }
        prev = mz;
    }
    true
}

/// Zero flag and m/z of one point, without any validation.
fn sample(layout: PointLayout, rec: &[u8], table: &V3cTable) -> (bool, f64) {
    match layout {
        PointLayout::Type1 | PointLayout::Type1CalOffset => (
            decode_intensity_type1(LittleEndian::read_u32(&rec[0..4])) == 0,
            decode_mz_type1(LittleEndian::read_u32(&rec[4..8])),
        ),
        PointLayout::Type1_6 => (
            LittleEndian::read_u16(&rec[0..2]) == 0,
            decode_mz_type1_6(LittleEndian::read_u32(&rec[2..6]) & 0xFFFF_FFF0),
        ),
        PointLayout::V3c => (
            table.decode_rounded(LittleEndian::read_u32(&rec[0..4])) == 0,
            decode_mz_type1_6_v3c(LittleEndian::read_u32(&rec[4..8])),
        ),
    }
}

/// Decide profile or centroid from the data of a function.
///
/// The first scan with at least [`MIN_CENTROID_LEN`] points decides: any zero
/// sample means profile, otherwise near-constant m/z steps mean profile and
/// anything else centroid. Returns [`CentroidMode::Undetermined`] when every scan
/// is too short or the file ends early.
pub fn detect_centroid_mode(
    dat: &[u8],
    records: &[IdxRecord],
    layout: PointLayout,
    table: &V3cTable,
) -> CentroidMode {
    let size = layout.point_size();
    let mut offset = 0usize;
    let mut zeros = 0usize;
    let mut prev_mz = 0.0f64;
    let mut deltas: Vec<f64> = Vec::new();
    for record in records {
        let count = record.point_count as usize;
        let end = offset + count * size;
        let Some(buf) = dat.get(offset..end) else {
            debug!("centroid detection stopped at a short DAT read");
            break;
        };
        offset = end;
        if count < MIN_CENTROID_LEN {
            continue;
        }
        deltas.clear();
        for rec in buf.chunks_exact(size) {
            let (zero, mz) = sample(layout, rec, table);
            if zero {
                zeros += 1;
            }
            deltas.push(mz - prev_mz);
            prev_mz = mz;
        }
        if zeros > 0 {
            return CentroidMode::Profile;
        }
        if deltas.len() > MIN_CENTROID_LEN {
            let regular = deltas[1..]
                .windows(2)
                .all(|w| (w[1] - w[0]).abs() <= MAX_DELTA_JITTER);
            return if regular {
                CentroidMode::Profile
            } else {
                CentroidMode::Centroid
            };
        }
    }
    CentroidMode::Undetermined
}

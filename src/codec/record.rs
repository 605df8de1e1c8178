//! Per-point record layouts inside `_FUNCxxx.DAT`.
//!
//! Every layout is normalized to a Type1 pair: an integer intensity and a Type1
//! m/z word. Downstream code only ever sees that pair.

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use super::error::CodecError;
use super::intensity::decode_intensity_type1;
use super::mz::{recode_mz_type1_6, recode_mz_type1_6_v3c};
use super::v3c::V3cTable;

/// Multipliers selected by the low nibble of a Type1-6 m/z word.
pub const TYPE1_6_FACTORS: [u32; 7] = [1, 4, 16, 64, 256, 1024, 4096];

/// One decoded point in Type1 form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedPoint {
    /// Integer ion count
    pub intensity: u32,
    /// Type1 m/z word
    pub mz_word: u32,
}

/// Byte layout of the points of one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PointLayout {
    /// Intensity word then m/z word (8 bytes)
    Type1,
    /// Type1 followed by an unused calibration word (12 bytes)
    Type1CalOffset,
    /// 16-bit intensity then a scaled m/z word (6 bytes)
    Type1_6,
    /// V3C intensity, m/z word, unused word (12 bytes)
    V3c,
}

impl PointLayout {
    /// Pick the layout from the probe results.
    pub fn select(type1_6: bool, v3c: bool, cal_offset: bool) -> Self {
        if v3c {
            PointLayout::V3c
        } else if type1_6 {
            PointLayout::Type1_6
        } else if cal_offset {
            PointLayout::Type1CalOffset
        } else {
            PointLayout::Type1
        }
    }

    /// Bytes per point.
    pub fn point_size(&self) -> usize {
        match self {
            PointLayout::Type1 => 8,
            PointLayout::Type1CalOffset | PointLayout::V3c => 12,
            PointLayout::Type1_6 => 6,
        }
    }

    /// Decode a single point record.
    pub fn decode_point(&self, rec: &[u8], v3c: &V3cTable) -> Result<PackedPoint, CodecError> {
        let need = self.point_size();
        if rec.len() < need {
            return Err(CodecError::Truncated {
                expected: need,
                actual: rec.len(),
            });
        }
        match self {
            PointLayout::Type1 | PointLayout::Type1CalOffset => Ok(PackedPoint {
                intensity: decode_intensity_type1(LittleEndian::read_u32(&rec[0..4])),
                mz_word: LittleEndian::read_u32(&rec[4..8]),
            }),
            PointLayout::Type1_6 => {
                let raw = LittleEndian::read_u16(&rec[0..2]) as u32;
                let mz = LittleEndian::read_u32(&rec[2..6]);
                let nibble = (mz & 0x0F) as u8;
                let factor = TYPE1_6_FACTORS
                    .get(nibble as usize)
                    .copied()
                    .ok_or(CodecError::BadScaleNibble(nibble))?;
                Ok(PackedPoint {
                    intensity: raw.saturating_mul(factor),
                    mz_word: recode_mz_type1_6(mz & 0xFFFF_FFF0),
                })
            }
            PointLayout::V3c => Ok(PackedPoint {
                intensity: v3c.decode_rounded(LittleEndian::read_u32(&rec[0..4])),
                mz_word: recode_mz_type1_6_v3c(LittleEndian::read_u32(&rec[4..8])),
            }),
        }
    }

    /// Decode a whole scan into `out`, replacing its contents.
    pub fn decode_scan(
        &self,
        buf: &[u8],
        count: usize,
        v3c: &V3cTable,
        out: &mut Vec<PackedPoint>,
    ) -> Result<(), CodecError> {
        let size = self.point_size();
        let need = size * count;
        if buf.len() < need {
            return Err(CodecError::Truncated {
                expected: need,
                actual: buf.len(),
            });
        }
        out.clear();
        out.reserve(count);
        for rec in buf[..need].chunks_exact(size) {
            out.push(self.decode_point(rec, v3c)?);
        }
        Ok(())
    }
}

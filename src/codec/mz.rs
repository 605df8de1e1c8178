//! Type1 and Type1-6 m/z words.

use super::error::CodecError;

/// Smallest word inside the Type1 band table.
pub const MZ_WORD_MIN: u32 = 0x3400_0000;

/// First word past the Type1 band table.
pub const MZ_WORD_MAX: u32 = 0x8400_0000;

/// Decoded value of any nonzero word below [`MZ_WORD_MIN`].
pub const MZ_FLOOR: f64 = 32.0;

/// Decoded value of any word at or above [`MZ_WORD_MAX`].
pub const MZ_CEILING: f64 = 32768.0;

/// One linear segment: `word / divisor - offset` for words at or above `lower`.
#[derive(Debug, Clone, Copy)]
pub struct MzBand {
    /// Inclusive lower word bound
    pub lower: u32,
    /// Word divisor
    pub divisor: f64,
    /// Subtracted after division
    pub offset: f64,
}

const fn mz_band(lower: u32, divisor: f64, offset: f64) -> MzBand {
    MzBand {
        lower,
        divisor,
        offset,
    }
}

/// Type1 band table, sorted by `lower`.
///
/// The 0x74000000 band carries an offset of 229375, one less than the regular
/// progression would give. Stored data depends on it.
pub const MZ_BANDS: [MzBand; 10] = [
    mz_band(0x3400_0000, 2097152.0, 384.0),
    mz_band(0x3C00_0000, 1048576.0, 896.0),
    mz_band(0x4400_0000, 524288.0, 2048.0),
    mz_band(0x4C00_0000, 262144.0, 4608.0),
    mz_band(0x5400_0000, 131072.0, 10240.0),
    mz_band(0x5C00_0000, 65536.0, 22528.0),
    mz_band(0x6400_0000, 32768.0, 49152.0),
    mz_band(0x6C00_0000, 16384.0, 106496.0),
    mz_band(0x7400_0000, 8192.0, 229375.0),
    mz_band(0x7C00_0000, 4096.0, 491520.0),
];

// Upper value bound of each band when encoding, in the same order.
const ENCODE_LIMITS: [f64; 10] = [
    64.0, 128.0, 256.0, 512.0, 1024.0, 2048.0, 4096.0, 8192.0, 16384.0, 32768.0,
];

/// Decode a Type1 m/z word, clipping into `[32, 32768]`.
pub fn decode_mz_type1(word: u32) -> f64 {
    if word == 0 {
        return 0.0;
    }
    if word < MZ_WORD_MIN {
        return MZ_FLOOR;
    }
    if word >= MZ_WORD_MAX {
        return MZ_CEILING;
    }
    let idx = MZ_BANDS.partition_point(|b| b.lower <= word) - 1;
    let b = MZ_BANDS[idx];
    word as f64 / b.divisor - b.offset
}

/// Strict variant used for scan decoding: nonzero words outside the table fail.
pub fn try_decode_mz_type1(word: u32) -> Result<f64, CodecError> {
    if word != 0 && !(MZ_WORD_MIN..MZ_WORD_MAX).contains(&word) {
        return Err(CodecError::MzOutOfRange(word));
    }
    Ok(decode_mz_type1(word))
}

/// Encode an m/z value as a Type1 word, choosing the band by magnitude.
pub fn encode_mz_type1(mz: f64) -> u32 {
    if mz < MZ_FLOOR {
        return MZ_WORD_MIN;
    }
    match ENCODE_LIMITS.iter().position(|&limit| mz < limit) {
        Some(idx) => {
            let b = MZ_BANDS[idx];
            ((mz + b.offset) * b.divisor) as u32
        }
        None => MZ_WORD_MAX,
    }
}

/// Decode a Type1-6 m/z word.
///
/// Bits 4..8 select a power-of-two divisor for the upper 24 bits.
pub fn decode_mz_type1_6(word: u32) -> f64 {
    if word == 0 {
        return 0.0;
    }
    let scale = (word & 0xFF) >> 4;
    let divisor = (16_777_216u32 >> scale) as f64;
    (word >> 8) as f64 / divisor
}

/// Re-quantize a Type1-6 m/z word into the Type1 band table.
///
/// A zero m/z stays the zero word so the point is dropped downstream.
pub fn recode_mz_type1_6(word: u32) -> u32 {
    let mz = decode_mz_type1_6(word);
    if mz == 0.0 {
        return 0;
    }
    encode_mz_type1(mz)
}

/// The V3C m/z field shares the Type1 layout.
pub fn decode_mz_type1_6_v3c(word: u32) -> f64 {
    decode_mz_type1(word)
}

/// Normalize a V3C m/z word through a decode/encode pass.
pub fn recode_mz_type1_6_v3c(word: u32) -> u32 {
    if word == 0 {
        return 0;
    }
    encode_mz_type1(decode_mz_type1_6_v3c(word))
}

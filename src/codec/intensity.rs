//! Type1 intensity words: 3-bit scale in bits 24..27, 24-bit mantissa below it.
//!
//! Every supported scale splits the mantissa into four quarter bands. A band maps
//! `[offset, offset + 0x100000)` linearly onto `[base, 2 * base)`, so consecutive
//! bands and consecutive scales tile the positive reals without gaps.

/// Lower mantissa bound of each quarter band.
pub const QUARTER_OFFSETS: [u32; 4] = [0x100000, 0x500000, 0x900000, 0xD00000];

/// Mantissa width covered by one quarter band.
pub const QUARTER_SPAN: u32 = 0x100000;

/// Highest scale code with a documented band table.
pub const MAX_SUPPORTED_SCALE: u8 = 6;

const QUARTER_THRESHOLDS: [u32; 3] = [0x500000, 0x900000, 0xD00000];

#[derive(Debug, Clone, Copy)]
struct Band {
    step: f64,
    base: f64,
}

const fn band(step: f64, base: f64) -> Band {
    Band { step, base }
}

// step = base / QUARTER_SPAN; every entry is an exact power of two.
const BANDS: [[Band; 4]; 7] = [
    [
        band(1.0 / 2097152.0, 0.5),
        band(1.0 / 1048576.0, 1.0),
        band(1.0 / 524288.0, 2.0),
        band(1.0 / 262144.0, 4.0),
    ],
    [
        band(1.0 / 131072.0, 8.0),
        band(1.0 / 65536.0, 16.0),
        band(1.0 / 32768.0, 32.0),
        band(1.0 / 16384.0, 64.0),
    ],
    [
        band(1.0 / 8192.0, 128.0),
        band(1.0 / 4096.0, 256.0),
        band(1.0 / 2048.0, 512.0),
        band(1.0 / 1024.0, 1024.0),
    ],
    [
        band(1.0 / 512.0, 2048.0),
        band(1.0 / 256.0, 4096.0),
        band(1.0 / 128.0, 8192.0),
        band(1.0 / 64.0, 16384.0),
    ],
    [
        band(1.0 / 32.0, 32768.0),
        band(1.0 / 16.0, 65536.0),
        band(1.0 / 8.0, 131072.0),
        band(1.0 / 4.0, 262144.0),
    ],
    [
        band(1.0 / 2.0, 524288.0),
        band(1.0, 1048576.0),
        band(2.0, 2097152.0),
        band(4.0, 4194304.0),
    ],
    [
        band(8.0, 8388608.0),
        band(16.0, 16777216.0),
        band(32.0, 33554432.0),
        band(64.0, 67108864.0),
    ],
];

fn quarter_of(lsw: u32) -> usize {
    QUARTER_THRESHOLDS.partition_point(|&t| t <= lsw)
}

/// Split a word into its scale code and 24-bit mantissa.
#[inline]
pub fn split_word(word: u32) -> (u8, u32) {
    (((word >> 24) & 0x07) as u8, word & 0x00FF_FFFF)
}

/// Unrounded magnitude of a Type1 intensity word.
///
/// Scale 7 has no band table; it keeps the legacy linear mapping
/// `(lsw - 0x100000) + 0x80000` clamped at zero.
pub fn decode_intensity_type1_raw(word: u32) -> f64 {
    if word == 0 {
        return 0.0;
    }
    let (scale, lsw) = split_word(word);
    if scale > MAX_SUPPORTED_SCALE {
        return ((lsw as f64 - QUARTER_SPAN as f64) + 524288.0).max(0.0);
    }
    let q = quarter_of(lsw);
    let b = BANDS[scale as usize][q];
    let r = (lsw as f64 - QUARTER_OFFSETS[q] as f64) * b.step + b.base;
    r.max(0.0)
}

/// Round a decoded magnitude the way the vendor counts ions.
///
/// Halves round up and a nonzero fraction never collapses to zero.
pub fn round_intensity(r: f64) -> u32 {
    if r <= 0.0 {
        return 0;
    }
    let whole = r.trunc();
    let frac = r - whole;
    let mut value = whole as u32;
    if frac >= 0.5 {
        value = value.saturating_add(1);
    } else if value == 0 && frac > 1e-8 {
        value = 1;
    }
    value
}

/// Decode a Type1 intensity word into an integer ion count.
pub fn decode_intensity_type1(word: u32) -> u32 {
    round_intensity(decode_intensity_type1_raw(word))
}

/// Encode an integer ion count as a Type1 intensity word.
///
/// Values below `0x200000` survive a decode exactly; larger values are quantized to
/// the step of their band. Values beyond the top band saturate.
pub fn encode_intensity_type1(value: u32) -> u32 {
    if value == 0 {
        return 0;
    }
    let x = value as f64;
    for (scale, quarters) in BANDS.iter().enumerate() {
        for (q, b) in quarters.iter().enumerate() {
            if x < 2.0 * b.base {
                let offset = QUARTER_OFFSETS[q];
                let delta = ((x - b.base) / b.step).round() as u32;
                let lsw = (offset + delta).min(offset + QUARTER_SPAN - 1);
                return ((scale as u32) << 24) | lsw;
            }
        }
    }
    ((MAX_SUPPORTED_SCALE as u32) << 24) | (QUARTER_OFFSETS[3] + QUARTER_SPAN - 1)
}

/// Width of one quantization step around `value` once encoded.
pub fn intensity_step(value: u32) -> f64 {
    let x = value as f64;
    for quarters in BANDS.iter() {
        for b in quarters.iter() {
            if x < 2.0 * b.base {
                return b.step;
            }
        }
    }
    BANDS[6][3].step
}

/// Magnitude at the start of a band, used by boundary checks.
pub fn band_base(scale: u8, quarter: usize) -> Option<f64> {
    BANDS
        .get(scale as usize)
        .and_then(|q| q.get(quarter))
        .map(|b| b.base)
}

/// Decode with an explicit quarter, bypassing band selection.
pub fn decode_in_quarter(scale: u8, quarter: usize, lsw: u32) -> Option<f64> {
    let b = BANDS.get(scale as usize)?.get(quarter)?;
    Some((lsw as f64 - QUARTER_OFFSETS[quarter] as f64) * b.step + b.base)
}

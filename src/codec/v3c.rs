//! V3C intensity words (centroid-only, 12-byte points).

/// Number of entries in the V3C offset table.
pub const V3C_TABLE_LEN: usize = 26;

/// Smallest encoded word that decodes to a positive intensity band.
const V3C_MIN_WORD: u32 = 4_194_304;

/// Mantissa values at or above this bound have no table entry.
const V3C_MAX_CLIP: u32 = 114_294_784;

/// Offsets subtracted after the per-index shift.
///
/// Entry `i + 1` extends entry `i` by `(16 + 4i) << (i + 1)`; the first two
/// entries are fixed.
#[derive(Debug, Clone)]
pub struct V3cTable {
    entries: Vec<u64>,
}

impl V3cTable {
    /// Build the table with [`V3C_TABLE_LEN`] entries.
    pub fn new() -> Self {
        let mut entries = Vec::with_capacity(V3C_TABLE_LEN);
        entries.push(4u64);
        entries.push(16u64);
        let mut cur = 16u64;
        let mut base = 12u64;
        for i in 1..(V3C_TABLE_LEN - 1) {
            base += 4;
            cur += base << i;
            entries.push(cur);
        }
        Self { entries }
    }

    /// Table entries in index order.
    pub fn entries(&self) -> &[u64] {
        &self.entries
    }

    /// Decode a V3C intensity word. Unsupported words decode to 0.
    pub fn decode(&self, word: u32) -> f64 {
        if word < V3C_MIN_WORD {
            return 0.0;
        }
        let clip = word & 0x0FFF_FFFF;
        if clip >= V3C_MAX_CLIP {
            return 0.0;
        }
        let range = clip >> 20;
        if range < 5 {
            return 0.0;
        }
        let index = ((range - 5) / 4) as usize;
        let Some(&offset) = self.entries.get(index) else {
            return 0.0;
        };
        let mut value = clip as f64;
        if index <= 20 {
            value /= (1u64 << (20 - index)) as f64;
        } else {
            value *= (1u64 << (index - 20)) as f64;
        }
        value - offset as f64
    }

    /// Decode and round to an integer count.
    pub fn decode_rounded(&self, word: u32) -> u32 {
        let v = self.decode(word);
        if v <= 0.0 {
            0
        } else {
            (v + 0.5) as u32
        }
    }
}

impl Default for V3cTable {
    fn default() -> Self {
        Self::new()
    }
}

// (upper bound, multiplier, additive) per band; value < upper encodes as multiplier * (value + additive).
const RECODE_BANDS: [(f64, f64, f64); 22] = [
    (1.0, 2097152.0, 2.0),
    (2.0, 1048576.0, 4.0),
    (4.0, 524288.0, 16.0),
    (8.0, 262144.0, 48.0),
    (16.0, 131072.0, 128.0),
    (32.0, 65536.0, 320.0),
    (64.0, 32768.0, 768.0),
    (128.0, 16384.0, 1792.0),
    (256.0, 8192.0, 4096.0),
    (512.0, 4096.0, 9216.0),
    (1024.0, 2048.0, 20480.0),
    (2048.0, 1024.0, 45056.0),
    (4096.0, 512.0, 98304.0),
    (8192.0, 256.0, 212992.0),
    (16384.0, 128.0, 458752.0),
    (32768.0, 64.0, 983040.0),
    (65536.0, 32.0, 2097152.0),
    (131072.0, 16.0, 4456448.0),
    (262144.0, 8.0, 9437184.0),
    (524288.0, 4.0, 19922944.0),
    (1048576.0, 2.0, 41943040.0),
    (2097152.0, 1.0, 88080384.0),
];

/// Encode an intensity as a V3C word.
///
/// Negative input maps to the sentinel `0x100000`; values past the last band to 0.
pub fn recode_intensity_type1_v3c(value: f64) -> u32 {
    if value < 0.0 {
        return 1_048_576;
    }
    if value == 0.0 {
        return 0;
    }
    RECODE_BANDS
        .iter()
        .find(|(upper, _, _)| value < *upper)
        .map(|&(_, mult, add)| (mult * (value + add)) as u32)
        .unwrap_or(0)
}

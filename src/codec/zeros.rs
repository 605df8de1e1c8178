//! Reconstruction of the zero-intensity shoulders stripped from profile scans.
//!
//! The instrument omits zero samples between peaks. The expected sample spacing at
//! a given m/z word follows a quadratic per power-of-two band, which is enough to
//! put back one zero on each side of every peak.

use super::record::PackedPoint;

/// Lowest band index with a spacing model.
pub const MIN_MZ_INDEX: i32 = 4;

/// Highest band index with a spacing model.
pub const MAX_MZ_INDEX: i32 = 13;

const MZ_BASE: [u32; 10] = [
    738_197_504,
    872_415_232,
    1_006_632_960,
    1_140_850_688,
    1_275_068_416,
    1_409_286_144,
    1_543_503_872,
    1_677_721_600,
    1_811_939_328,
    1_946_157_056,
];

const ANCHOR_INDEX: i32 = 11;
const ANCHOR_COEFS: [f64; 3] = [-1.03068049758955e-14, 4.66931570737946e-06, 647.990335979525];

/// Band index of an m/z word, or `None` when it has no spacing model.
pub fn mz_index(word: u32) -> Option<i32> {
    if word == 0 {
        return None;
    }
    let idx = (((word >> 26) as i32) - 1) / 2 - 1;
    (MIN_MZ_INDEX..=MAX_MZ_INDEX).contains(&idx).then_some(idx)
}

/// Spacing model: coefficients scale by sqrt(2) per band away from the anchor.
#[derive(Debug, Clone)]
pub struct ZeroModel {
    coefs: Vec<[f64; 3]>,
}

impl ZeroModel {
    /// Build the per-band coefficient table.
    pub fn new() -> Self {
        let sqrt2 = std::f64::consts::SQRT_2;
        let coefs = (MIN_MZ_INDEX..=MAX_MZ_INDEX)
            .map(|idx| {
                let factor = sqrt2.powi(ANCHOR_INDEX - idx);
                [
                    ANCHOR_COEFS[0] * factor,
                    ANCHOR_COEFS[1] * factor,
                    ANCHOR_COEFS[2] * factor,
                ]
            })
            .collect();
        Self { coefs }
    }

    /// Expected spacing in m/z word units, rounded to a multiple of 8.
    pub fn spacing(&self, word: u32) -> Option<u32> {
        let idx = mz_index(word)?;
        let slot = (idx - MIN_MZ_INDEX) as usize;
        let [c2, c1, c0] = self.coefs[slot];
        let d = word.wrapping_sub(MZ_BASE[slot]) as f64;
        let dv = c2 * d * d + c1 * d + c0;
        Some(8 * (0.5 + dv / 8.0).max(0.0) as u32)
    }

    /// Re-insert zero points around every run of nonzero samples.
    ///
    /// Returns `None` when any m/z word lies outside the modelled bands.
    pub fn restore(&self, points: &[PackedPoint]) -> Option<Vec<PackedPoint>> {
        let first = points.first()?;
        let zero = |mz_word: u32| PackedPoint {
            intensity: 0,
            mz_word,
        };
        let mut out = Vec::with_capacity(points.len() * 2 + 2);
        let mut prev_dv = self.spacing(first.mz_word)?;
        out.push(zero(first.mz_word.saturating_sub(prev_dv)));
        out.push(*first);
        let mut prev = first.mz_word;
        for p in &points[1..] {
            let dv = self.spacing(p.mz_word)?;
            let gap = p.mz_word.saturating_sub(prev);
            let width = dv + prev_dv;
            if gap > 5 * width {
                out.push(zero(prev + prev_dv));
                out.push(zero(p.mz_word - dv));
            } else if gap > 3 * width {
                out.push(zero(((prev as u64 + p.mz_word as u64 + 1) / 2) as u32));
            }
            out.push(*p);
            prev = p.mz_word;
            prev_dv = dv;
        }
        out.push(zero(prev.saturating_add(prev_dv)));
        Some(out)
    }
}

impl Default for ZeroModel {
    fn default() -> Self {
        Self::new()
    }
}

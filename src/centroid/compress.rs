//! Dictionary and exception-list encoding of peak arrays.
//!
//! m/z values are quantized to a fixed quantum and stored as consecutive deltas.
//! The most frequent delta is the implicit default; positions whose delta differs
//! are listed either in a high-frequency exception list (index into a small delta
//! dictionary) or in a low-frequency list (raw delta). Positions are stored as
//! gaps of one to three bytes.
//!
//! Layout of the m/z blob (little endian):
//!
//! | Field | Type |
//! |-------|------|
//! | version | `u8` |
//! | count | `u32` |
//! | quantum | `f64` |
//! | first value (quanta) | `i64` |
//! | dictionary length | `u8` |
//! | dictionary | `i64` x length, entry 0 is the base delta |
//! | high-frequency count | `u32` |
//! | high-frequency entries | gap + `u8` index |
//! | low-frequency count | `u32` |
//! | low-frequency entries | gap + `i64` delta |
//!
//! Intensities use a value dictionary of up to 255 entries; code `0xFF` escapes
//! to a raw `f32`.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use super::error::CentroidError;
use crate::peaks::PeakArrays;

/// Blob format version.
pub const COMPRESSION_VERSION: u8 = 1;

/// Default m/z quantum.
pub const DEFAULT_MZ_QUANTUM: f64 = 1e-6;

/// Maximum number of deltas kept in the dictionary.
pub const MAX_DICT_LEN: usize = 255;

const MAX_GAP: u32 = (1 << 21) - 1;
const INTENSITY_ESCAPE: u8 = 0xFF;

/// Counts of the encoded components, for diagnostics and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressionSummary {
    /// Distinct deltas in the dictionary
    pub dictionary_len: usize,
    /// Positions resolved through the dictionary
    pub high_frequency: usize,
    /// Positions stored with a raw delta
    pub low_frequency: usize,
}

/// Compressed m/z and intensity blobs for one scan.
#[derive(Debug, Clone)]
pub struct CompressedPeaks {
    /// Encoded m/z stream
    pub mz: Vec<u8>,
    /// Encoded intensity stream
    pub intensity: Vec<u8>,
    /// Component counts
    pub summary: CompressionSummary,
}

fn write_gap(out: &mut Vec<u8>, gap: u32) {
    let mut v = gap;
    for _ in 0..2 {
        if v < 0x80 {
            break;
        }
        out.push((v as u8 & 0x7F) | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
}

fn read_gap(cur: &mut Cursor<&[u8]>) -> Result<u32, CentroidError> {
    let mut value = 0u32;
    for shift in [0u32, 7, 14] {
        let b = read_u8(cur)?;
        if shift == 14 || b & 0x80 == 0 {
            return Ok(value | ((b as u32) << shift));
        }
        value |= ((b & 0x7F) as u32) << shift;
    }
    Ok(value)
}

fn corrupt(what: &str) -> CentroidError {
    CentroidError::Corrupt(what.to_string())
}

fn read_u8(cur: &mut Cursor<&[u8]>) -> Result<u8, CentroidError> {
    cur.read_u8().map_err(|_| corrupt("unexpected end of blob"))
}

fn read_u32(cur: &mut Cursor<&[u8]>) -> Result<u32, CentroidError> {
    cur.read_u32::<LittleEndian>()
        .map_err(|_| corrupt("unexpected end of blob"))
}

fn read_i64(cur: &mut Cursor<&[u8]>) -> Result<i64, CentroidError> {
    cur.read_i64::<LittleEndian>()
        .map_err(|_| corrupt("unexpected end of blob"))
}

fn read_f64(cur: &mut Cursor<&[u8]>) -> Result<f64, CentroidError> {
    cur.read_f64::<LittleEndian>()
        .map_err(|_| corrupt("unexpected end of blob"))
}

fn read_f32(cur: &mut Cursor<&[u8]>) -> Result<f32, CentroidError> {
    cur.read_f32::<LittleEndian>()
        .map_err(|_| corrupt("unexpected end of blob"))
}

/// Histogram sorted by descending frequency, ties by ascending value.
fn ranked<K: Copy + Eq + std::hash::Hash + Ord>(values: impl Iterator<Item = K>) -> Vec<K> {
    let mut hist: HashMap<K, usize> = HashMap::new();
    for v in values {
        *hist.entry(v).or_insert(0) += 1;
    }
    let mut entries: Vec<(K, usize)> = hist.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    entries.into_iter().map(|(k, _)| k).collect()
}

fn encode_positions(
    positions: &[(u32, i64)],
    filler: i64,
    emit: impl Fn(&mut Vec<u8>, i64),
) -> (Vec<u8>, usize) {
    let mut body = Vec::new();
    let mut count = 0usize;
    let mut last = 0u32;
    for &(pos, payload) in positions {
        let mut gap = pos - last;
        while gap > MAX_GAP {
            write_gap(&mut body, MAX_GAP);
            emit(&mut body, filler);
            count += 1;
            gap -= MAX_GAP;
        }
        write_gap(&mut body, gap);
        emit(&mut body, payload);
        count += 1;
        last = pos;
    }
    (body, count)
}

fn compress_mz(mz: &[f64], quantum: f64) -> (Vec<u8>, CompressionSummary) {
    let quanta: Vec<i64> = mz.iter().map(|&v| (v / quantum).round() as i64).collect();
    let deltas: Vec<i64> = quanta.windows(2).map(|w| w[1] - w[0]).collect();
    let mut dict = ranked(deltas.iter().copied());
    dict.truncate(MAX_DICT_LEN);
    let index: HashMap<i64, u8> = dict.iter().enumerate().map(|(i, &d)| (d, i as u8)).collect();
    let base = dict.first().copied().unwrap_or(0);

    let mut hf = Vec::new();
    let mut lf = Vec::new();
    for (i, &d) in deltas.iter().enumerate() {
        if d == base {
            continue;
        }
        let pos = (i + 1) as u32;
        match index.get(&d) {
            Some(&k) => hf.push((pos, k as i64)),
            None => lf.push((pos, d)),
        }
    }

    // long gaps are bridged with base-delta entries, which decode as no-ops
    let (hf_body, hf_count) = encode_positions(&hf, 0, |out, k| out.push(k as u8));
    let (lf_body, lf_count) =
        encode_positions(&lf, base, |out, d| out.extend_from_slice(&d.to_le_bytes()));

    let mut out = Vec::with_capacity(34 + dict.len() * 8 + hf_body.len() + lf_body.len());
    out.push(COMPRESSION_VERSION);
    out.extend_from_slice(&(mz.len() as u32).to_le_bytes());
    out.extend_from_slice(&quantum.to_le_bytes());
    out.extend_from_slice(&quanta.first().copied().unwrap_or(0).to_le_bytes());
    out.push(dict.len() as u8);
    for &d in &dict {
        out.extend_from_slice(&d.to_le_bytes());
    }
    out.extend_from_slice(&(hf_count as u32).to_le_bytes());
    out.extend_from_slice(&hf_body);
    out.extend_from_slice(&(lf_count as u32).to_le_bytes());
    out.extend_from_slice(&lf_body);

    let summary = CompressionSummary {
        dictionary_len: dict.len(),
        high_frequency: hf.len(),
        low_frequency: lf.len(),
    };
    (out, summary)
}

fn compress_intensity(values: &[f32]) -> Vec<u8> {
    let mut dict = ranked(values.iter().map(|v| v.to_bits()));
    dict.truncate(MAX_DICT_LEN);
    let index: HashMap<u32, u8> = dict.iter().enumerate().map(|(i, &b)| (b, i as u8)).collect();

    let mut out = Vec::with_capacity(6 + dict.len() * 4 + values.len());
    out.push(COMPRESSION_VERSION);
    out.extend_from_slice(&(values.len() as u32).to_le_bytes());
    out.push(dict.len() as u8);
    for &bits in &dict {
        out.extend_from_slice(&bits.to_le_bytes());
    }
    for v in values {
        match index.get(&v.to_bits()) {
            Some(&k) if k != INTENSITY_ESCAPE => out.push(k),
            _ => {
                out.push(INTENSITY_ESCAPE);
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
    }
    out
}

/// Compress a scan with the default quantum.
pub fn compress(peaks: &PeakArrays) -> Result<CompressedPeaks, CentroidError> {
    compress_with_quantum(peaks, DEFAULT_MZ_QUANTUM)
}

/// Compress a scan, quantizing m/z to `quantum`.
pub fn compress_with_quantum(peaks: &PeakArrays, quantum: f64) -> Result<CompressedPeaks, CentroidError> {
    if !(quantum > 0.0) {
        return Err(CentroidError::BadParameter(format!(
            "m/z quantum must be positive, got {}",
            quantum
        )));
    }
    peaks.validate().map_err(CentroidError::BadParameter)?;
    if peaks.len() > u32::MAX as usize {
        return Err(CentroidError::BadParameter("scan too long".to_string()));
    }
    let (mz, summary) = compress_mz(&peaks.mz, quantum);
    Ok(CompressedPeaks {
        mz,
        intensity: compress_intensity(&peaks.intensity),
        summary,
    })
}

/// `expected` is the point count of the matching intensity blob.
fn decompress_mz(blob: &[u8], expected: usize) -> Result<Vec<f64>, CentroidError> {
    let mut cur = Cursor::new(blob);
    if read_u8(&mut cur)? != COMPRESSION_VERSION {
        return Err(corrupt("unknown m/z blob version"));
    }
    let count = read_u32(&mut cur)? as usize;
    if count != expected {
        return Err(corrupt("m/z and intensity point counts differ"));
    }
    let quantum = read_f64(&mut cur)?;
    let first = read_i64(&mut cur)?;
    let dict_len = read_u8(&mut cur)? as usize;
    let dict = (0..dict_len)
        .map(|_| read_i64(&mut cur))
        .collect::<Result<Vec<_>, _>>()?;
    let base = dict.first().copied().unwrap_or(0);

    let mut deltas = vec![base; count.saturating_sub(1)];
    let mut set = |pos: u32, d: i64| -> Result<(), CentroidError> {
        let slot = (pos as usize)
            .checked_sub(1)
            .and_then(|p| deltas.get_mut(p))
            .ok_or_else(|| corrupt("exception position out of range"))?;
        *slot = d;
        Ok(())
    };

    let hf_count = read_u32(&mut cur)?;
    let mut pos = 0u32;
    for _ in 0..hf_count {
        pos = pos
            .checked_add(read_gap(&mut cur)?)
            .ok_or_else(|| corrupt("exception position overflow"))?;
        let k = read_u8(&mut cur)? as usize;
        let d = *dict.get(k).ok_or_else(|| corrupt("dictionary index out of range"))?;
        set(pos, d)?;
    }
    let lf_count = read_u32(&mut cur)?;
    let mut pos = 0u32;
    for _ in 0..lf_count {
        pos = pos
            .checked_add(read_gap(&mut cur)?)
            .ok_or_else(|| corrupt("exception position overflow"))?;
        let d = read_i64(&mut cur)?;
        set(pos, d)?;
    }

    let mut out = Vec::with_capacity(count);
    if count > 0 {
        let mut q = first;
        out.push(q as f64 * quantum);
        for d in deltas {
            q += d;
            out.push(q as f64 * quantum);
        }
    }
    Ok(out)
}

fn decompress_intensity(blob: &[u8]) -> Result<Vec<f32>, CentroidError> {
    let mut cur = Cursor::new(blob);
    if read_u8(&mut cur)? != COMPRESSION_VERSION {
        return Err(corrupt("unknown intensity blob version"));
    }
    let count = read_u32(&mut cur)? as usize;
    let dict_len = read_u8(&mut cur)? as usize;
    let dict = (0..dict_len)
        .map(|_| read_u32(&mut cur).map(f32::from_bits))
        .collect::<Result<Vec<_>, _>>()?;
    // every point takes at least one code byte
    let remaining = blob.len().saturating_sub(cur.position() as usize);
    if count > remaining {
        return Err(corrupt("point count exceeds intensity payload"));
    }
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let code = read_u8(&mut cur)?;
        if code == INTENSITY_ESCAPE {
            out.push(read_f32(&mut cur)?);
        } else {
            out.push(*dict.get(code as usize).ok_or_else(|| corrupt("intensity code out of range"))?);
        }
    }
    let mut rest = Vec::new();
    let _ = cur.read_to_end(&mut rest);
    if !rest.is_empty() {
        return Err(corrupt("trailing bytes after intensity stream"));
    }
    Ok(out)
}

/// Invert [`compress`].
pub fn decompress(mz: &[u8], intensity: &[u8]) -> Result<PeakArrays, CentroidError> {
    let intensity = decompress_intensity(intensity)?;
    let peaks = PeakArrays::new(decompress_mz(mz, intensity.len())?, intensity);
    peaks.validate().map_err(CentroidError::Corrupt)?;
    Ok(peaks)
}

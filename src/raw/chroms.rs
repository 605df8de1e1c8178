//! Chromatogram traces: TIC, UV-trace functions and `_CHROnnn.DAT` channels.
//!
//! All trace times are in minutes, as stored by the instrument.

use std::fmt;
use std::path::Path;

use log::{debug, info, warn};
use serde::Serialize;

use super::cursor::ByteCursor;
use super::error::RawError;
use super::idx::IdxRecord;
use super::layout::{chro_file_name, read_optional, read_required, CHROMS_FILE};

/// Detector channel prefixes searched for in `_CHROMS.INF` properties, in order.
pub const CHANNEL_PREFIXES: [&str; 4] = ["PDA Ch", "FLR Ch", "ELS Ch", "TUV Ch"];

// Fallback record strides for UV functions whose DAT size does not divide evenly
const UV_FALLBACK_DAT_STRIDE: usize = 6;
const UV_FALLBACK_IDX_STRIDE: usize = 22;

/// Kind of chromatogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TraceKind {
    /// Total ion current of the first function
    Tic,
    /// UV, fluorescence or light-scattering detector trace
    Absorption,
}

impl TraceKind {
    /// Controlled vocabulary name stored in `Chromatogram.ChromatogramType`.
    pub fn cv_name(&self) -> &'static str {
        match self {
            TraceKind::Tic => "total ion current chromatogram",
            TraceKind::Absorption => "absorption chromatogram",
        }
    }
}

impl fmt::Display for TraceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cv_name())
    }
}

/// One chromatogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    /// Row identifier, e.g. `TIC1` or `Trace0_230`
    pub identifier: String,
    /// Chromatogram kind
    pub kind: TraceKind,
    /// Retention times in minutes
    pub times: Vec<f64>,
    /// Trace values
    pub values: Vec<f32>,
}

impl Trace {
    /// Empty trace.
    pub fn new(identifier: impl Into<String>, kind: TraceKind) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
            times: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Append one point.
    pub fn push(&mut self, time: f64, value: f32) {
        self.times.push(time);
        self.values.push(value);
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// True without points.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// TIC trace built from the index of the first function.
pub fn tic_trace(records: &[IdxRecord]) -> Trace {
    let mut trace = Trace::new("TIC1", TraceKind::Tic);
    for r in records {
        trace.push(r.retention_time as f64, r.tic);
    }
    trace
}

/// Split a UV-trace function into one trace per wavelength.
///
/// Every scan holds a single sample: the value and time come from the IDX
/// record, the wavelength from the first two (big-endian) bytes of the DAT
/// record. Traces are numbered from `first_index` in order of first appearance.
pub fn uv_function_traces(
    idx: &[u8],
    dat: &[u8],
    idx_record_size: usize,
    first_index: usize,
) -> Result<Vec<Trace>, RawError> {
    let dat_body = dat.get(4..).unwrap_or_default();
    let mut scans = idx.len() / idx_record_size;
    let mut idx_stride = idx_record_size;
    let mut dat_stride = if scans > 0 { dat.len() / scans } else { 0 };
    if scans == 0 || dat.len() != dat_stride * scans {
        debug!("UV function: DAT size {} uneven, using fixed strides", dat.len());
        dat_stride = UV_FALLBACK_DAT_STRIDE;
        idx_stride = UV_FALLBACK_IDX_STRIDE;
        scans = idx.len().saturating_sub(4) / UV_FALLBACK_IDX_STRIDE;
    }

    let mut freqs: Vec<u16> = Vec::new();
    let mut traces: Vec<Trace> = Vec::new();
    let mut idx_cur = ByteCursor::new("uv idx", idx);
    let mut dat_cur = ByteCursor::new("uv dat", dat_body);
    for scan in 0..scans {
        let dat_pos = scan * dat_stride;
        let idx_pos = 8 + scan * idx_stride;
        if dat_pos + 2 > dat_body.len() || idx_pos + 8 > idx.len() {
            warn!("UV function: records end after {} of {} scans", scan, scans);
            break;
        }
        dat_cur.seek(dat_pos)?;
        let hi = dat_cur.read_u8()? as u16;
        let lo = dat_cur.read_u8()? as u16;
        let freq = (hi << 8) | lo;

        idx_cur.seek(idx_pos)?;
        let value = idx_cur.read_f32()?;
        let time = idx_cur.read_f32()?;

        let slot = match freqs.iter().position(|&f| f == freq) {
            Some(slot) => slot,
            None => {
                freqs.push(freq);
                traces.push(Trace::new(
                    format!("Trace{}_{}", first_index + traces.len(), freq),
                    TraceKind::Absorption,
                ));
                traces.len() - 1
            }
        };
        traces[slot].push(time as f64, value);
    }
    Ok(traces)
}

/// One matched `_CHROMS.INF` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChromChannel {
    /// 0-based record index; the data file is `_CHRO{index+1:03}.DAT`
    pub record: usize,
    /// Channel label, e.g. `TUV_ChA`
    pub channel: String,
    /// Wavelength text with spaces replaced by `_`, possibly empty
    pub wavelength: String,
    /// Raw property string
    pub property: String,
    /// Raw value string
    pub value: String,
}

impl ChromChannel {
    /// Data file name.
    pub fn file_name(&self) -> String {
        chro_file_name(self.record as u32 + 1)
    }

    /// Identifier suffix, `_TUV_ChA_254_nm` style.
    pub fn label(&self) -> String {
        let mut label = format!("_{}", self.channel);
        if !self.wavelength.is_empty() {
            label.push('_');
            label.push_str(&self.wavelength);
        }
        label
    }
}

fn channel_of(property: &str) -> Option<ChromChannel> {
    let (found, prefix) = CHANNEL_PREFIXES
        .iter()
        .find_map(|p| property.find(p).map(|i| (i, *p)))?;
    let mut channel = prefix.replace(' ', "_");
    if let Some(c) = property.get(found + 6..found + 7) {
        channel.push_str(c);
    }
    let wavelength = match property.find("nm") {
        Some(nm) => property
            .get(found + 8..)
            .map(|rest| rest.chars().take(nm).collect::<String>().replace(' ', "_"))
            .unwrap_or_default(),
        None => String::new(),
    };
    Some(ChromChannel {
        record: 0,
        channel,
        wavelength,
        property: property.to_string(),
        value: String::new(),
    })
}

/// Parse `_CHROMS.INF`, keeping entries whose property names a known detector
/// channel.
pub fn parse_chroms_inf(bytes: &[u8]) -> Result<Vec<ChromChannel>, RawError> {
    let mut cur = ByteCursor::new(CHROMS_FILE, bytes);
    let offset = cur.read_u16()? as usize;
    cur.seek(4)?;
    let inc = cur.read_u16()? as usize;
    if inc == 0 {
        return Err(RawError::ParseError(format!("{}: zero record length", CHROMS_FILE)));
    }
    let count = bytes.len().saturating_sub(offset) / inc;
    let mut out = Vec::new();
    for record in 0..count {
        cur.seek(offset + record * inc + 4)?;
        let property = cur.read_cstr(inc)?;
        let value = cur.read_cstr(inc)?;
        if let Some(mut channel) = channel_of(&property) {
            debug!("{}: channel {} in record {}", CHROMS_FILE, channel.channel, record + 1);
            channel.record = record;
            channel.value = value;
            out.push(channel);
        }
    }
    Ok(out)
}

/// Parse a `_CHROnnn.DAT` file into (time, value) pairs.
pub fn read_chro_dat(name: &str, bytes: &[u8]) -> Result<(Vec<f64>, Vec<f32>), RawError> {
    let mut cur = ByteCursor::new(name, bytes);
    let offset = cur.read_u16()? as usize;
    let n = bytes.len().saturating_sub(offset) / 8;
    cur.seek(offset.min(bytes.len()))?;
    let mut times = Vec::with_capacity(n);
    let mut values = Vec::with_capacity(n);
    for _ in 0..n {
        times.push(cur.read_f32()? as f64);
        values.push(cur.read_f32()?);
    }
    Ok((times, values))
}

/// Read every detector channel listed in `_CHROMS.INF`.
///
/// Identifiers continue the `Trace` numbering from `base`. A missing index file
/// yields no traces; a listed channel whose data file is missing is an error.
pub fn read_auxiliary_traces(dir: &Path, base: usize) -> Result<Vec<Trace>, RawError> {
    let Some(bytes) = read_optional(&dir.join(CHROMS_FILE))? else {
        debug!("no {}", CHROMS_FILE);
        return Ok(Vec::new());
    };
    let channels = parse_chroms_inf(&bytes)?;
    let mut traces = Vec::with_capacity(channels.len());
    for (i, channel) in channels.iter().enumerate() {
        let path = dir.join(channel.file_name());
        let data = read_required(&path)?;
        let (times, values) = read_chro_dat(&channel.file_name(), &data)?;
        if times.is_empty() {
            warn!("{} holds no samples", channel.file_name());
        }
        info!(
            "{}: {} samples for {}",
            channel.file_name(),
            times.len(),
            channel.channel
        );
        traces.push(Trace {
            identifier: format!("Trace{}{}", base + i, channel.label()),
            kind: TraceKind::Absorption,
            times,
            values,
        });
    }
    Ok(traces)
}

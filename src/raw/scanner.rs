//! Per-function scan access over a Waters `.raw` directory.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use crate::classify::{CentroidMode, Classification, FunctionInfo, CALIBRATION_LEVEL};
use crate::codec::{PackedPoint, PointLayout, V3cTable};

use super::error::RawError;
use super::idx::{detect_record_size, parse_idx, IdxRecord};
use super::layout::{function_path, read_optional, read_required, FunctionFile};
use super::probe::{detect_centroid_mode, probe_cal_offset, probe_type1_6, probe_v3c};
use super::sts::{detect_shift, parse_header, read_precursors};

/// Run-wide decoding decisions, made once when the directory is opened.
#[derive(Debug, Clone)]
pub struct RawRun {
    dir: PathBuf,
    /// IDX record size (22 or 30)
    pub idx_record_size: usize,
    /// All functions use 6-byte Type1-6 points
    pub type1_6: bool,
    /// STS precursors sit at the shifted offset
    pub sts_shifted: bool,
    v3c: V3cTable,
}

/// Header of one scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScanHeader {
    /// 0-based index inside the function
    pub index: usize,
    /// Retention time in seconds
    pub retention_time: f64,
    /// Total ion current from the index
    pub tic: f32,
    /// Stored point count
    pub point_count: usize,
    /// Precursor m/z from the status file, when present and set
    pub precursor_mz: Option<f64>,
    /// Peak mode after detection
    pub centroid: bool,
}

/// Index, status and point data of one function.
#[derive(Debug, Clone)]
pub struct FunctionScans {
    /// 1-based function number
    pub function: u32,
    /// Point layout of the DAT file
    pub layout: PointLayout,
    /// Index records, one per scan
    pub records: Vec<IdxRecord>,
    /// Precursor m/z per scan, -1 when unknown
    pub precursors: Vec<f32>,
    /// Peak mode detected from the data
    pub centroid_mode: CentroidMode,
    offsets: Vec<usize>,
    dat: Vec<u8>,
    v3c: V3cTable,
}

fn first_scan_bytes(records: &[IdxRecord]) -> usize {
    records.first().map_or(0, |r| r.point_count as usize)
}

impl RawRun {
    /// Probe the directory: IDX record size, Type1-6 points and the STS offset.
    pub fn open(
        dir: &Path,
        classification: &Classification,
        expect_no_zeros: bool,
    ) -> Result<Self, RawError> {
        let mut sizes = Vec::new();
        for f in &classification.functions {
            if let Ok(meta) = fs::metadata(function_path(dir, f.number(), FunctionFile::Idx)) {
                sizes.push(meta.len() as usize);
            }
        }
        let first_idx = read_optional(&function_path(dir, 1, FunctionFile::Idx)).unwrap_or(None);
        let idx_record_size = detect_record_size(&sizes, first_idx.as_deref())
            .ok_or_else(|| RawError::ParseError("can't determine IDX record size".to_string()))?;
        debug!("IDX record size {}", idx_record_size);

        let type1_6 = match &first_idx {
            Some(bytes) => {
                let records = parse_idx("_FUNC001.IDX", bytes, idx_record_size)?;
                let count = first_scan_bytes(&records);
                match read_optional(&function_path(dir, 1, FunctionFile::Dat)) {
                    Ok(Some(dat)) => probe_type1_6(&dat, count, expect_no_zeros),
                    _ => false,
                }
            }
            None => false,
        };
        if type1_6 {
            info!("Type1-6 points detected");
        }

        let mut sts_shifted = false;
        for f in classification.functions.iter().filter(|f| f.is_ms()) {
            if !needs_status(f) {
                continue;
            }
            let path = function_path(dir, f.number(), FunctionFile::Sts);
            let Ok(Some(bytes)) = read_optional(&path) else {
                continue;
            };
            let Ok(header) = parse_header(&path.display().to_string(), &bytes) else {
                continue;
            };
            if header.header_len < bytes.len() {
                sts_shifted = detect_shift(&bytes[header.header_len..], type1_6);
                break;
            }
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            idx_record_size,
            type1_6,
            sts_shifted,
            v3c: V3cTable::new(),
        })
    }

    /// Raw directory path.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read index, status and data files of one function and probe its layout.
    ///
    /// `last` marks the highest-numbered function; only a last lock-mass function
    /// is probed for V3C points.
    pub fn open_function(&self, info: &FunctionInfo, last: bool) -> Result<FunctionScans, RawError> {
        let function = info.number();
        let idx_path = function_path(&self.dir, function, FunctionFile::Idx);
        let idx_name = idx_path.display().to_string();
        let records = parse_idx(&idx_name, &read_required(&idx_path)?, self.idx_record_size)?;
        let dat = read_required(&function_path(&self.dir, function, FunctionFile::Dat))?;

        let precursors = if needs_status(info) {
            self.read_status(function, records.len())?
        } else {
            vec![-1.0; records.len()]
        };

        let first = first_scan_bytes(&records);
        let v3c = last && info.ms_level == CALIBRATION_LEVEL && probe_v3c(&dat, first, &self.v3c);
        let cal_offset =
            !self.type1_6 && info.ms_level != CALIBRATION_LEVEL && probe_cal_offset(&dat, first);
        let layout = PointLayout::select(self.type1_6, v3c, cal_offset);
        debug!("function {}: layout {:?}", function, layout);

        let mut offsets = Vec::with_capacity(records.len());
        let mut offset = 0usize;
        for r in &records {
            offsets.push(offset);
            offset += r.point_count as usize * layout.point_size();
        }
        if offset > dat.len() {
            warn!(
                "function {}: index describes {} bytes, DAT holds {}",
                function,
                offset,
                dat.len()
            );
        }

        let centroid_mode = detect_centroid_mode(&dat, &records, layout, &self.v3c);
        let metadata_centroid = records.first().is_some_and(IdxRecord::is_centroid);
        match centroid_mode {
            CentroidMode::Undetermined => info!(
                "function {}: peak mode undetermined, using metadata ({})",
                function,
                if metadata_centroid { "centroid" } else { "profile" }
            ),
            mode => {
                let detected = mode == CentroidMode::Centroid;
                if detected != metadata_centroid {
                    warn!(
                        "caution: function {} detected {:?} while metadata says {}",
                        function,
                        mode,
                        if metadata_centroid { "centroid" } else { "profile" }
                    );
                }
            }
        }

        Ok(FunctionScans {
            function,
            layout,
            records,
            precursors,
            centroid_mode,
            offsets,
            dat,
            v3c: self.v3c.clone(),
        })
    }

    fn read_status(&self, function: u32, scans: usize) -> Result<Vec<f32>, RawError> {
        let path = function_path(&self.dir, function, FunctionFile::Sts);
        match read_optional(&path) {
            Ok(Some(bytes)) => read_precursors(
                &path.display().to_string(),
                &bytes,
                scans,
                self.type1_6,
                self.sts_shifted,
            ),
            Ok(None) | Err(RawError::ParseError(_)) => {
                warn!("function {}: no usable STS file", function);
                Ok(vec![-1.0; scans])
            }
            Err(e) => Err(e),
        }
    }
}

/// Status records are read for every function past the first, and for a first
/// function that is not a survey.
fn needs_status(info: &FunctionInfo) -> bool {
    info.number() > 1 || info.ms_level > 1
}

impl FunctionScans {
    /// Number of scans.
    pub fn scan_count(&self) -> usize {
        self.records.len()
    }

    /// Header of scan `index`.
    pub fn header(&self, index: usize) -> Option<ScanHeader> {
        let record = self.records.get(index)?;
        let precursor = self.precursors.get(index).copied().unwrap_or(-1.0);
        let centroid = match self.centroid_mode {
            CentroidMode::Undetermined => record.is_centroid(),
            mode => mode == CentroidMode::Centroid,
        };
        Some(ScanHeader {
            index,
            retention_time: record.retention_time_secs() as f64,
            tic: record.tic,
            point_count: record.point_count as usize,
            precursor_mz: (precursor > 0.0).then_some(precursor as f64),
            centroid,
        })
    }

    /// Decode scan `index` into `out`, reusing its allocation.
    pub fn read_scan(&self, index: usize, out: &mut Vec<PackedPoint>) -> Result<(), RawError> {
        let record = self.records.get(index).ok_or_else(|| {
            RawError::ParseError(format!(
                "function {}: scan {} out of range",
                self.function, index
            ))
        })?;
        let count = record.point_count as usize;
        let start = self.offsets[index];
        let need = count * self.layout.point_size();
        let Some(buf) = self.dat.get(start..start + need) else {
            return Err(RawError::PartialRead {
                file: format!("_FUNC{:03}.DAT scan {}", self.function, index + 1),
                expected: need,
                actual: self.dat.len().saturating_sub(start),
            });
        };
        self.layout.decode_scan(buf, count, &self.v3c, out)?;
        Ok(())
    }
}

//! Scan access over an opened raw directory.

use std::borrow::Cow;
use std::cell::RefCell;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;

use crate::calibration::{CalibrationTable, FunctionCalibration, HEADER_FILE};
use crate::classify::{classify_dir, Classification, FunctionInfo, RunMetadata, UV_LEVEL};
use crate::codec::{try_decode_mz_type1, PackedPoint, ZeroModel};
use crate::peaks::PeakArrays;
use crate::raw::{FunctionScans, RawRun, ScanHeader};

use super::config::ReaderConfig;
use super::diagnostics::{Diagnostic, DiagnosticsSink, LogSink};
use super::error::ReaderError;
use super::parent::ParentTracker;

/// `function=F process=0 scan=S` with a 1-based in-function scan.
pub fn native_id(function: u32, scan: usize) -> String {
    format!("function={} process=0 scan={}", function, scan)
}

/// Description of one scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanInfo {
    /// 1-based function number
    pub function: u32,
    /// 0-based index inside the function
    pub index: usize,
    /// Run-wide 1-based scan number
    pub scan_number: i64,
    /// Native id
    pub native_id: String,
    /// MS level
    pub ms_level: i32,
    /// Retention time in seconds
    pub retention_time: f64,
    /// Precursor m/z of fragment scans
    pub precursor_mz: Option<f64>,
    /// Peaks are centroids
    pub centroid: bool,
    /// Total ion current from the index
    pub tic: f32,
    /// Stored point count
    pub point_count: usize,
    /// Parent scan number
    pub parent_scan_number: Option<i64>,
    /// Parent native id
    pub parent_native_id: Option<String>,
}

/// Capability interface of a scan producer.
pub trait ScanSource {
    /// Read metadata and index files.
    fn open(&mut self) -> Result<(), ReaderError>;

    /// Release loaded data.
    fn close(&mut self);

    /// Number of scans; zero before [`open`](Self::open).
    fn scan_count(&self) -> usize;

    /// Description of scan `index` (0-based, run-wide).
    fn scan_info(&self, index: usize) -> Result<ScanInfo, ReaderError>;

    /// Decoded and calibrated peaks of scan `index`.
    fn scan_data(&self, index: usize, out: &mut PeakArrays) -> Result<(), ReaderError>;
}

/// Metadata and run-wide probe results of an opened directory.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Classification and text metadata
    pub metadata: RunMetadata,
    /// IDX/DAT/STS decisions
    pub run: RawRun,
    /// `_HEADER.TXT` calibration
    pub calibration: CalibrationTable,
}

impl RunContext {
    /// Classify the run and probe its files.
    pub fn open(dir: &Path, config: &ReaderConfig, sink: &dyn DiagnosticsSink) -> Result<Self, ReaderError> {
        if !dir.is_dir() {
            return Err(ReaderError::NotFound(dir.display().to_string()));
        }
        let metadata = classify_dir(dir)?;
        for f in &metadata.classification.functions {
            sink.report(Diagnostic::FunctionClassified {
                function: f.number(),
                ms_level: f.ms_level,
                role: f.role,
                rules: f.trace.clone(),
            });
        }
        for caution in &metadata.classification.cautions {
            sink.report(Diagnostic::caution(caution.clone()));
        }

        let run = RawRun::open(dir, &metadata.classification, config.expect_no_zeros)?;
        let calibration = match CalibrationTable::from_dir(dir) {
            Ok(table) => {
                for caution in table.cautions() {
                    sink.report(Diagnostic::caution(format!("{}: {}", HEADER_FILE, caution)));
                }
                table
            }
            Err(e) => {
                sink.report(Diagnostic::caution(format!(
                    "{} not read ({}), m/z values stay uncalibrated",
                    HEADER_FILE, e
                )));
                CalibrationTable::default()
            }
        };
        Ok(Self {
            metadata,
            run,
            calibration,
        })
    }

    /// Raw directory.
    pub fn dir(&self) -> &Path {
        self.run.dir()
    }

    /// Classification result.
    pub fn classification(&self) -> &Classification {
        &self.metadata.classification
    }

    /// Functions converted to spectra, in number order.
    pub fn ms_functions(&self) -> impl Iterator<Item = &FunctionInfo> {
        self.classification().functions.iter().filter(|f| f.is_ms())
    }

    /// UV trace functions, in number order.
    pub fn uv_functions(&self) -> impl Iterator<Item = &FunctionInfo> {
        self.classification()
            .functions
            .iter()
            .filter(|f| f.ms_level == UV_LEVEL)
    }

    /// Load one function and attach its calibration.
    pub fn decoder(&self, info: &FunctionInfo, config: &ReaderConfig) -> Result<FunctionDecoder, ReaderError> {
        let last = info.number() == self.classification().function_count();
        let scans = self.run.open_function(info, last)?;
        let calibration =
            self.calibration
                .for_function(info.number(), info.ms_level, self.classification().accurate);
        debug!(
            "function {}: calibration {}",
            info.number(),
            if calibration.is_some() { "applied" } else { "skipped" }
        );
        Ok(FunctionDecoder {
            info: info.clone(),
            scans,
            calibration,
            zero_model: config.restore_zeros.then(ZeroModel::new),
        })
    }
}

/// Decodes the scans of one function into calibrated peaks.
#[derive(Debug, Clone)]
pub struct FunctionDecoder {
    /// Classified function
    pub info: FunctionInfo,
    /// Index, status and point data
    pub scans: FunctionScans,
    /// Calibration applied to decoded m/z values
    pub calibration: Option<FunctionCalibration>,
    zero_model: Option<ZeroModel>,
}

impl FunctionDecoder {
    /// 1-based function number.
    pub fn function(&self) -> u32 {
        self.info.number()
    }

    /// Number of scans.
    pub fn scan_count(&self) -> usize {
        self.scans.scan_count()
    }

    /// Header of scan `index`.
    pub fn header(&self, index: usize) -> Result<ScanHeader, ReaderError> {
        self.scans.header(index).ok_or_else(|| {
            ReaderError::BadParameter(format!(
                "function {} has no scan {}",
                self.function(),
                index + 1
            ))
        })
    }

    /// Decode scan `index` into `out`, using `scratch` for the packed points.
    ///
    /// Points with an m/z word of zero are dropped; any other word outside the
    /// Type1 table fails the whole scan.
    pub fn decode(
        &self,
        index: usize,
        scratch: &mut Vec<PackedPoint>,
        out: &mut PeakArrays,
    ) -> Result<(), ReaderError> {
        let header = self.header(index)?;
        scratch.clear();
        scratch.try_reserve(header.point_count).map_err(|e| {
            ReaderError::AllocationFailure(format!(
                "function {} scan {}: {} points: {}",
                self.function(),
                index + 1,
                header.point_count,
                e
            ))
        })?;
        self.scans.read_scan(index, scratch)?;

        let points: Cow<'_, [PackedPoint]> = match &self.zero_model {
            Some(model) if !header.centroid => match model.restore(scratch) {
                Some(restored) => Cow::Owned(restored),
                None => Cow::Borrowed(scratch.as_slice()),
            },
            _ => Cow::Borrowed(scratch.as_slice()),
        };

        out.clear();
        for p in points.iter().filter(|p| p.mz_word != 0) {
            out.push(try_decode_mz_type1(p.mz_word)?, p.intensity as f32);
        }
        if let Some(calibration) = &self.calibration {
            calibration.apply_all(&mut out.mz);
        }
        Ok(())
    }
}

/// File presence and short-read failures skip a function; anything else aborts.
pub(crate) fn is_function_local(e: &ReaderError) -> bool {
    matches!(
        e,
        ReaderError::NotFound(_) | ReaderError::PartialRead { .. } | ReaderError::ParseError(_)
    )
}

/// [`ScanSource`] over a Waters `.raw` directory, holding every function in memory.
///
/// Scans are numbered run-wide in function order.
///
/// ```rust,no_run
/// use pico::peaks::PeakArrays;
/// use pico::reader::{ReaderConfig, ScanSource, WatersSource};
///
/// let mut source = WatersSource::new("sample.raw", ReaderConfig::default());
/// source.open()?;
/// let mut peaks = PeakArrays::default();
/// for i in 0..source.scan_count() {
///     let info = source.scan_info(i)?;
///     source.scan_data(i, &mut peaks)?;
///     println!("{} MS{} {} peaks", info.native_id, info.ms_level, peaks.len());
/// }
/// # Ok::<(), pico::reader::ReaderError>(())
/// ```
pub struct WatersSource {
    dir: PathBuf,
    config: ReaderConfig,
    context: Option<RunContext>,
    decoders: Vec<FunctionDecoder>,
    scans: Vec<ScanInfo>,
    slots: Vec<(usize, usize)>,
    skipped: Vec<(u32, String)>,
    scratch: RefCell<Vec<PackedPoint>>,
}

impl WatersSource {
    /// Source for `dir`; nothing is read until [`ScanSource::open`].
    pub fn new<P: AsRef<Path>>(dir: P, config: ReaderConfig) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            config,
            context: None,
            decoders: Vec::new(),
            scans: Vec::new(),
            slots: Vec::new(),
            skipped: Vec::new(),
            scratch: RefCell::new(Vec::new()),
        }
    }

    /// Metadata of the opened run.
    pub fn context(&self) -> Option<&RunContext> {
        self.context.as_ref()
    }

    /// Loaded functions.
    pub fn decoders(&self) -> &[FunctionDecoder] {
        &self.decoders
    }

    /// Functions that could not be loaded, with the reason.
    pub fn skipped(&self) -> &[(u32, String)] {
        &self.skipped
    }

    fn build_index(&mut self) -> Result<(), ReaderError> {
        let mut scan_number = 0i64;
        for (slot, decoder) in self.decoders.iter().enumerate() {
            for index in 0..decoder.scan_count() {
                let header = decoder.header(index)?;
                scan_number += 1;
                self.slots.push((slot, index));
                self.scans.push(ScanInfo {
                    function: decoder.function(),
                    index,
                    scan_number,
                    native_id: native_id(decoder.function(), index + 1),
                    ms_level: decoder.info.ms_level,
                    retention_time: header.retention_time,
                    precursor_mz: header.precursor_mz,
                    centroid: header.centroid,
                    tic: header.tic,
                    point_count: header.point_count,
                    parent_scan_number: None,
                    parent_native_id: None,
                });
            }
        }

        let mut order: Vec<usize> = (0..self.scans.len()).collect();
        order.sort_by(|&a, &b| {
            let (x, y) = (&self.scans[a], &self.scans[b]);
            x.retention_time
                .total_cmp(&y.retention_time)
                .then(x.scan_number.cmp(&y.scan_number))
        });
        let mut tracker = ParentTracker::new();
        for i in order {
            let scan = &self.scans[i];
            if let Some((number, native)) = tracker.observe(scan.ms_level, scan.scan_number, &scan.native_id) {
                self.scans[i].parent_scan_number = Some(number);
                self.scans[i].parent_native_id = Some(native);
            }
        }
        Ok(())
    }
}

impl ScanSource for WatersSource {
    fn open(&mut self) -> Result<(), ReaderError> {
        self.close();
        self.config.validate()?;
        let context = RunContext::open(&self.dir, &self.config, &LogSink)?;
        for info in context.ms_functions() {
            match context.decoder(info, &self.config) {
                Ok(decoder) => self.decoders.push(decoder),
                Err(e) if is_function_local(&e) => {
                    warn!("function {} not loaded: {}", info.number(), e);
                    self.skipped.push((info.number(), e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }
        self.context = Some(context);
        self.build_index()
    }

    fn close(&mut self) {
        self.context = None;
        self.decoders.clear();
        self.scans.clear();
        self.slots.clear();
        self.skipped.clear();
        self.scratch.borrow_mut().clear();
    }

    fn scan_count(&self) -> usize {
        self.scans.len()
    }

    fn scan_info(&self, index: usize) -> Result<ScanInfo, ReaderError> {
        self.scans
            .get(index)
            .cloned()
            .ok_or_else(|| ReaderError::BadParameter(format!("no scan at index {}", index)))
    }

    fn scan_data(&self, index: usize, out: &mut PeakArrays) -> Result<(), ReaderError> {
        let &(slot, scan) = self
            .slots
            .get(index)
            .ok_or_else(|| ReaderError::BadParameter(format!("no scan at index {}", index)))?;
        let mut scratch = self.scratch.borrow_mut();
        self.decoders[slot].decode(scan, &mut scratch, out)
    }
}
